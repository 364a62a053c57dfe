//! LSTM cell and the stacked price predictor built from a [`Topology`]

use super::config::Topology;
use super::layers::{dropout_mask, Dense, DenseGradients};
use super::optimizer::{Adam, Optimizer};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;

/// Parameter tensors per cell: 8 gate matrices + 4 gate biases
const SLOTS_PER_CELL: usize = 12;

// Initial weights stay inside the near-linear region of the activations.
const INPUT_WEIGHT_LIMIT: f64 = 0.02;
const RECURRENT_WEIGHT_LIMIT: f64 = 0.005;

// Forget biases are spread across units, covering memory horizons from
// roughly one step up to the whole window.
const FORGET_BIAS_LOW: f64 = -1.0;
const FORGET_BIAS_HIGH: f64 = 2.0;

/// LSTM cell with per-gate weights
#[derive(Debug, Clone)]
pub struct LstmCell {
    /// Input size per time step
    pub input_size: usize,
    /// Hidden state size
    pub hidden_size: usize,

    // input gate
    w_ii: Array2<f64>,
    w_hi: Array2<f64>,
    b_i: Array1<f64>,

    // forget gate
    w_if: Array2<f64>,
    w_hf: Array2<f64>,
    b_f: Array1<f64>,

    // cell candidate
    w_ig: Array2<f64>,
    w_hg: Array2<f64>,
    b_g: Array1<f64>,

    // output gate
    w_io: Array2<f64>,
    w_ho: Array2<f64>,
    b_o: Array1<f64>,
}

/// Everything the backward pass needs from one forward step
#[derive(Debug, Clone)]
struct StepCache {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
    h: Array1<f64>,
}

impl LstmCell {
    /// Creates a cell with small uniform weights and per-unit forget biases
    /// spanning short to long memory horizons
    pub fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let mut matrix = |rows: usize, cols: usize, limit: f64| {
            Array2::random_using((rows, cols), Uniform::new(-limit, limit), rng)
        };

        let w_ii = matrix(hidden_size, input_size, INPUT_WEIGHT_LIMIT);
        let w_if = matrix(hidden_size, input_size, INPUT_WEIGHT_LIMIT);
        let w_ig = matrix(hidden_size, input_size, INPUT_WEIGHT_LIMIT);
        let w_io = matrix(hidden_size, input_size, INPUT_WEIGHT_LIMIT);
        let w_hi = matrix(hidden_size, hidden_size, RECURRENT_WEIGHT_LIMIT);
        let w_hf = matrix(hidden_size, hidden_size, RECURRENT_WEIGHT_LIMIT);
        let w_hg = matrix(hidden_size, hidden_size, RECURRENT_WEIGHT_LIMIT);
        let w_ho = matrix(hidden_size, hidden_size, RECURRENT_WEIGHT_LIMIT);

        let b_f = if hidden_size > 1 {
            let step = (FORGET_BIAS_HIGH - FORGET_BIAS_LOW) / (hidden_size - 1) as f64;
            Array1::from_shape_fn(hidden_size, |j| FORGET_BIAS_LOW + step * j as f64)
        } else {
            Array1::from_elem(1, (FORGET_BIAS_LOW + FORGET_BIAS_HIGH) / 2.0)
        };

        Self {
            input_size,
            hidden_size,
            w_ii,
            w_hi,
            b_i: Array1::zeros(hidden_size),
            w_if,
            w_hf,
            b_f,
            w_ig,
            w_hg,
            b_g: Array1::zeros(hidden_size),
            w_io,
            w_ho,
            b_o: Array1::zeros(hidden_size),
        }
    }

    /// Forward pass for one time step.
    ///
    /// Returns the next hidden state and cell state.
    pub fn forward(
        &self,
        x: &Array1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        // i = σ(W_ii x + W_hi h + b_i)
        let i_gate = sigmoid(&(self.w_ii.dot(x) + self.w_hi.dot(h_prev) + &self.b_i));

        // f = σ(W_if x + W_hf h + b_f)
        let f_gate = sigmoid(&(self.w_if.dot(x) + self.w_hf.dot(h_prev) + &self.b_f));

        // g = tanh(W_ig x + W_hg h + b_g)
        let g = tanh(&(self.w_ig.dot(x) + self.w_hg.dot(h_prev) + &self.b_g));

        // o = σ(W_io x + W_ho h + b_o)
        let o_gate = sigmoid(&(self.w_io.dot(x) + self.w_ho.dot(h_prev) + &self.b_o));

        // c = f ⊙ c_prev + i ⊙ g
        let c_next = &f_gate * c_prev + &i_gate * &g;

        // h = o ⊙ tanh(c)
        let h_next = &o_gate * &tanh(&c_next);

        (h_next, c_next)
    }

    /// Zero-initialized hidden and cell state
    pub fn init_hidden(&self) -> (Array1<f64>, Array1<f64>) {
        (
            Array1::zeros(self.hidden_size),
            Array1::zeros(self.hidden_size),
        )
    }

    /// Hidden states for every step of an input sequence (inference path)
    fn run_sequence(&self, inputs: &[Array1<f64>]) -> Vec<Array1<f64>> {
        let (mut h, mut c) = self.init_hidden();
        let mut hidden = Vec::with_capacity(inputs.len());

        for x in inputs {
            let (h_next, c_next) = self.forward(x, &h, &c);
            h = h_next;
            c = c_next;
            hidden.push(h.clone());
        }

        hidden
    }

    /// Forward pass over a sequence, keeping the per-step caches for BPTT
    fn run_sequence_cached(&self, inputs: &[Array1<f64>]) -> Vec<StepCache> {
        let (mut h, mut c) = self.init_hidden();
        let mut caches = Vec::with_capacity(inputs.len());

        for x in inputs {
            let i_gate = sigmoid(&(self.w_ii.dot(x) + self.w_hi.dot(&h) + &self.b_i));
            let f_gate = sigmoid(&(self.w_if.dot(x) + self.w_hf.dot(&h) + &self.b_f));
            let g = tanh(&(self.w_ig.dot(x) + self.w_hg.dot(&h) + &self.b_g));
            let o_gate = sigmoid(&(self.w_io.dot(x) + self.w_ho.dot(&h) + &self.b_o));

            let c_next = &f_gate * &c + &i_gate * &g;
            let tanh_c = tanh(&c_next);
            let h_next = &o_gate * &tanh_c;

            caches.push(StepCache {
                x: x.clone(),
                h_prev: h.clone(),
                c_prev: c.clone(),
                i: i_gate,
                f: f_gate,
                g,
                o: o_gate,
                tanh_c,
                h: h_next.clone(),
            });

            h = h_next;
            c = c_next;
        }

        caches
    }

    /// Backpropagation through time over one cached sequence.
    ///
    /// `dh_ext[t]` is the loss gradient arriving at the hidden state of step
    /// `t` from outside the cell (the output layer, or the layer above).
    /// Returns the parameter gradients and the gradient w.r.t. each input
    /// step, for routing into the layer below.
    fn backward_sequence(
        &self,
        caches: &[StepCache],
        dh_ext: &[Array1<f64>],
    ) -> (CellGradients, Vec<Array1<f64>>) {
        let mut grads = CellGradients::zeros(self.input_size, self.hidden_size);
        let mut dx_seq = vec![Array1::zeros(self.input_size); caches.len()];
        let mut dh_next: Array1<f64> = Array1::zeros(self.hidden_size);
        let mut dc_next: Array1<f64> = Array1::zeros(self.hidden_size);

        for t in (0..caches.len()).rev() {
            let cache = &caches[t];
            let dh = &dh_ext[t] + &dh_next;

            // h = o ⊙ tanh(c)
            let da_o = &dh * &cache.tanh_c * &cache.o.mapv(|v| v * (1.0 - v));
            let dc = &dh * &cache.o * &cache.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;

            // c = f ⊙ c_prev + i ⊙ g
            let da_f = &dc * &cache.c_prev * &cache.f.mapv(|v| v * (1.0 - v));
            let da_i = &dc * &cache.g * &cache.i.mapv(|v| v * (1.0 - v));
            let da_g = &dc * &cache.i * &cache.g.mapv(|v| 1.0 - v * v);

            grads.dw_ii += &outer(&da_i, &cache.x);
            grads.dw_hi += &outer(&da_i, &cache.h_prev);
            grads.db_i += &da_i;

            grads.dw_if += &outer(&da_f, &cache.x);
            grads.dw_hf += &outer(&da_f, &cache.h_prev);
            grads.db_f += &da_f;

            grads.dw_ig += &outer(&da_g, &cache.x);
            grads.dw_hg += &outer(&da_g, &cache.h_prev);
            grads.db_g += &da_g;

            grads.dw_io += &outer(&da_o, &cache.x);
            grads.dw_ho += &outer(&da_o, &cache.h_prev);
            grads.db_o += &da_o;

            dx_seq[t] = self.w_ii.t().dot(&da_i)
                + self.w_if.t().dot(&da_f)
                + self.w_ig.t().dot(&da_g)
                + self.w_io.t().dot(&da_o);

            dh_next = self.w_hi.t().dot(&da_i)
                + self.w_hf.t().dot(&da_f)
                + self.w_hg.t().dot(&da_g)
                + self.w_ho.t().dot(&da_o);

            dc_next = &dc * &cache.f;
        }

        (grads, dx_seq)
    }

    fn apply_gradients(&mut self, grads: &CellGradients, opts: &mut [Box<dyn Optimizer>]) {
        opts[0].update_weights(&mut self.w_ii, &grads.dw_ii);
        opts[1].update_weights(&mut self.w_hi, &grads.dw_hi);
        opts[2].update_biases(&mut self.b_i, &grads.db_i);

        opts[3].update_weights(&mut self.w_if, &grads.dw_if);
        opts[4].update_weights(&mut self.w_hf, &grads.dw_hf);
        opts[5].update_biases(&mut self.b_f, &grads.db_f);

        opts[6].update_weights(&mut self.w_ig, &grads.dw_ig);
        opts[7].update_weights(&mut self.w_hg, &grads.dw_hg);
        opts[8].update_biases(&mut self.b_g, &grads.db_g);

        opts[9].update_weights(&mut self.w_io, &grads.dw_io);
        opts[10].update_weights(&mut self.w_ho, &grads.dw_ho);
        opts[11].update_biases(&mut self.b_o, &grads.db_o);
    }

    /// Total number of trainable parameters in the cell
    pub fn num_parameters(&self) -> usize {
        4 * (self.hidden_size * self.input_size
            + self.hidden_size * self.hidden_size
            + self.hidden_size)
    }
}

/// Parameter gradients for one [`LstmCell`], accumulated over a mini-batch
#[derive(Debug, Clone)]
pub struct CellGradients {
    dw_ii: Array2<f64>,
    dw_hi: Array2<f64>,
    db_i: Array1<f64>,
    dw_if: Array2<f64>,
    dw_hf: Array2<f64>,
    db_f: Array1<f64>,
    dw_ig: Array2<f64>,
    dw_hg: Array2<f64>,
    db_g: Array1<f64>,
    dw_io: Array2<f64>,
    dw_ho: Array2<f64>,
    db_o: Array1<f64>,
}

impl CellGradients {
    fn zeros(input_size: usize, hidden_size: usize) -> Self {
        Self {
            dw_ii: Array2::zeros((hidden_size, input_size)),
            dw_hi: Array2::zeros((hidden_size, hidden_size)),
            db_i: Array1::zeros(hidden_size),
            dw_if: Array2::zeros((hidden_size, input_size)),
            dw_hf: Array2::zeros((hidden_size, hidden_size)),
            db_f: Array1::zeros(hidden_size),
            dw_ig: Array2::zeros((hidden_size, input_size)),
            dw_hg: Array2::zeros((hidden_size, hidden_size)),
            db_g: Array1::zeros(hidden_size),
            dw_io: Array2::zeros((hidden_size, input_size)),
            dw_ho: Array2::zeros((hidden_size, hidden_size)),
            db_o: Array1::zeros(hidden_size),
        }
    }

    fn add(&mut self, other: &CellGradients) {
        self.dw_ii += &other.dw_ii;
        self.dw_hi += &other.dw_hi;
        self.db_i += &other.db_i;
        self.dw_if += &other.dw_if;
        self.dw_hf += &other.dw_hf;
        self.db_f += &other.db_f;
        self.dw_ig += &other.dw_ig;
        self.dw_hg += &other.dw_hg;
        self.db_g += &other.db_g;
        self.dw_io += &other.dw_io;
        self.dw_ho += &other.dw_ho;
        self.db_o += &other.db_o;
    }

    fn clamp(&mut self, limit: f64) {
        for m in [
            &mut self.dw_ii,
            &mut self.dw_hi,
            &mut self.dw_if,
            &mut self.dw_hf,
            &mut self.dw_ig,
            &mut self.dw_hg,
            &mut self.dw_io,
            &mut self.dw_ho,
        ] {
            m.mapv_inplace(|g| g.clamp(-limit, limit));
        }
        for b in [
            &mut self.db_i,
            &mut self.db_f,
            &mut self.db_g,
            &mut self.db_o,
        ] {
            b.mapv_inplace(|g| g.clamp(-limit, limit));
        }
    }
}

/// Gradients for every parameter tensor of a [`PricePredictor`]
#[derive(Debug, Clone)]
pub struct PredictorGradients {
    cells: Vec<CellGradients>,
    output: DenseGradients,
}

impl PredictorGradients {
    /// Clamps every gradient entry to `[-limit, limit]`
    pub fn clamp(&mut self, limit: f64) {
        for cell in &mut self.cells {
            cell.clamp(limit);
        }
        self.output.clamp(limit);
    }
}

/// Stacked LSTM predictor: one window of scaled values in, one scalar out.
///
/// The recurrent depth is fixed by the [`Topology`] it is built from; dropout
/// is applied to each recurrent layer's output during training only. The
/// predictor owns one optimizer instance per parameter tensor.
pub struct PricePredictor {
    cells: Vec<LstmCell>,
    drop_rates: Vec<f64>,
    output: Dense,
    optimizers: Vec<Box<dyn Optimizer>>,
}

impl PricePredictor {
    /// Builds the network for the given topology, drawing initial weights
    /// from the supplied seeded generator.
    pub fn new(topology: &Topology, rng: &mut StdRng) -> Self {
        let (cells, drop_rates) = match *topology {
            Topology::SingleLayer { units, drop_rate } => {
                (vec![LstmCell::new(1, units, rng)], vec![drop_rate])
            }
            Topology::TwoLayer {
                units_1,
                drop_rate_1,
                units_2,
                drop_rate_2,
            } => (
                vec![
                    LstmCell::new(1, units_1, rng),
                    LstmCell::new(units_1, units_2, rng),
                ],
                vec![drop_rate_1, drop_rate_2],
            ),
        };

        let output = Dense::new(topology.output_units(), rng);
        let n_slots = cells.len() * SLOTS_PER_CELL + 2;
        let optimizers = (0..n_slots)
            .map(|_| Box::new(Adam::new(0.001)) as Box<dyn Optimizer>)
            .collect();

        Self {
            cells,
            drop_rates,
            output,
            optimizers,
        }
    }

    /// Replaces the update strategy for every parameter tensor
    pub fn set_optimizer(&mut self, optimizer: Box<dyn Optimizer>) {
        for slot in &mut self.optimizers {
            *slot = optimizer.clone_box();
        }
    }

    /// Number of recurrent layers
    pub fn depth(&self) -> usize {
        self.cells.len()
    }

    /// Total trainable parameter count
    pub fn num_parameters(&self) -> usize {
        let cell_params: usize = self.cells.iter().map(|c| c.num_parameters()).sum();
        cell_params + self.output.num_parameters()
    }

    /// Predicts the next scaled value from one history window.
    ///
    /// Deterministic inference path: no dropout, no state mutation.
    pub fn predict_window(&self, window: ArrayView1<f64>) -> f64 {
        let mut seq: Vec<Array1<f64>> = window
            .iter()
            .map(|&v| Array1::from_elem(1, v))
            .collect();

        for cell in &self.cells {
            seq = cell.run_sequence(&seq);
        }

        let final_h = &seq[seq.len() - 1];
        self.output.forward(final_h)
    }

    /// Zeroed gradient buffers matching this predictor's parameters
    pub fn zero_gradients(&self) -> PredictorGradients {
        PredictorGradients {
            cells: self
                .cells
                .iter()
                .map(|c| CellGradients::zeros(c.input_size, c.hidden_size))
                .collect(),
            output: DenseGradients::zeros(self.output.weights.len()),
        }
    }

    /// Forward/backward pass for one training sample.
    ///
    /// `inv_batch` folds the mini-batch mean into the loss gradient
    /// (`dL/dpred = 2 (pred - target) / batch_len`). Accumulates into
    /// `grads` and returns the sample's squared error.
    pub fn backprop_window(
        &self,
        window: ArrayView1<f64>,
        target: f64,
        inv_batch: f64,
        rng: &mut StdRng,
        grads: &mut PredictorGradients,
    ) -> f64 {
        let seq_len = window.len();
        let mut inputs: Vec<Array1<f64>> = window
            .iter()
            .map(|&v| Array1::from_elem(1, v))
            .collect();

        // forward through the stack, keeping caches and dropout masks
        let mut all_caches = Vec::with_capacity(self.cells.len());
        let mut all_masks: Vec<Option<Vec<Array1<f64>>>> = Vec::with_capacity(self.cells.len());

        for (cell, &rate) in self.cells.iter().zip(&self.drop_rates) {
            let caches = cell.run_sequence_cached(&inputs);
            let mut hidden: Vec<Array1<f64>> = caches.iter().map(|c| c.h.clone()).collect();

            let masks = if rate > 0.0 {
                let masks: Vec<Array1<f64>> = hidden
                    .iter()
                    .map(|h| dropout_mask(h.len(), rate, rng))
                    .collect();
                for (h, mask) in hidden.iter_mut().zip(&masks) {
                    *h = &*h * mask;
                }
                Some(masks)
            } else {
                None
            };

            all_caches.push(caches);
            all_masks.push(masks);
            inputs = hidden;
        }

        let final_h = inputs[seq_len - 1].clone();
        let pred = self.output.forward(&final_h);
        let err = pred - target;

        // backward: output layer, then BPTT down the stack
        let dy = 2.0 * err * inv_batch;
        let (dense_grads, dfinal) = self.output.backward(&final_h, dy);
        grads.output.add(&dense_grads);

        let top = self.cells.len() - 1;
        let mut d_last = dfinal;
        if let Some(masks) = &all_masks[top] {
            d_last = &d_last * &masks[seq_len - 1];
        }

        let mut dh_ext: Vec<Array1<f64>> =
            vec![Array1::zeros(self.cells[top].hidden_size); seq_len];
        dh_ext[seq_len - 1] = d_last;

        for layer in (0..self.cells.len()).rev() {
            let (cell_grads, dx_seq) =
                self.cells[layer].backward_sequence(&all_caches[layer], &dh_ext);
            grads.cells[layer].add(&cell_grads);

            if layer > 0 {
                dh_ext = dx_seq;
                if let Some(masks) = &all_masks[layer - 1] {
                    for (d, mask) in dh_ext.iter_mut().zip(masks) {
                        *d = &*d * mask;
                    }
                }
            }
        }

        err * err
    }

    /// Applies accumulated mini-batch gradients through the per-tensor
    /// optimizer instances
    pub fn apply_gradients(&mut self, grads: &PredictorGradients) {
        let mut slot = 0;
        for (cell, cell_grads) in self.cells.iter_mut().zip(&grads.cells) {
            cell.apply_gradients(
                cell_grads,
                &mut self.optimizers[slot..slot + SLOTS_PER_CELL],
            );
            slot += SLOTS_PER_CELL;
        }

        self.optimizers[slot].update_biases(&mut self.output.weights, &grads.output.dw);
        self.optimizers[slot + 1].update_biases(&mut self.output.bias, &grads.output.db);
    }
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| v.tanh())
}

/// Outer product of two vectors: `[a.len(), b.len()]`
fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    let col = a.view().insert_axis(Axis(1));
    let row = b.view().insert_axis(Axis(0));
    col.dot(&row)
}
