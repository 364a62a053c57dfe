//! Output layer and dropout for the recurrent stack

use ndarray::Array1;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::Rng;

/// Single linear output unit: maps the final hidden state to the scalar
/// prediction.
#[derive(Debug, Clone)]
pub struct Dense {
    /// Weight vector (one entry per hidden unit)
    pub weights: Array1<f64>,
    /// Bias, kept as a length-1 array so the optimizer can update it in place
    pub bias: Array1<f64>,
}

impl Dense {
    /// Creates the layer with Xavier-style uniform initialization
    pub fn new(input_size: usize, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (input_size + 1) as f64).sqrt();

        Self {
            weights: Array1::random_using(input_size, Uniform::new(-limit, limit), rng),
            bias: Array1::zeros(1),
        }
    }

    pub fn forward(&self, input: &Array1<f64>) -> f64 {
        self.weights.dot(input) + self.bias[0]
    }

    /// Gradients for one sample given `dy = dLoss/dPrediction`.
    ///
    /// Returns the weight/bias gradients and the gradient flowing back into
    /// the layer's input.
    pub fn backward(&self, input: &Array1<f64>, dy: f64) -> (DenseGradients, Array1<f64>) {
        let grads = DenseGradients {
            dw: input * dy,
            db: Array1::from_elem(1, dy),
        };
        let dinput = &self.weights * dy;

        (grads, dinput)
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.len() + self.bias.len()
    }
}

/// Accumulated gradients for a [`Dense`] layer
#[derive(Debug, Clone)]
pub struct DenseGradients {
    pub dw: Array1<f64>,
    pub db: Array1<f64>,
}

impl DenseGradients {
    pub fn zeros(input_size: usize) -> Self {
        Self {
            dw: Array1::zeros(input_size),
            db: Array1::zeros(1),
        }
    }

    pub fn add(&mut self, other: &DenseGradients) {
        self.dw += &other.dw;
        self.db += &other.db;
    }

    pub fn clamp(&mut self, limit: f64) {
        self.dw.mapv_inplace(|g| g.clamp(-limit, limit));
        self.db.mapv_inplace(|g| g.clamp(-limit, limit));
    }
}

/// Inverted-dropout mask: kept units are scaled by `1 / (1 - rate)` so the
/// expected activation is unchanged and prediction needs no rescaling.
pub fn dropout_mask(len: usize, rate: f64, rng: &mut StdRng) -> Array1<f64> {
    Array1::from_shape_fn(len, |_| {
        if rng.gen::<f64>() > rate {
            1.0 / (1.0 - rate)
        } else {
            0.0
        }
    })
}
