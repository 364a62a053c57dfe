//! Optimization strategies for gradient updates
//!
//! The update rule is pluggable: the predictor holds one optimizer instance
//! per parameter tensor, cloned from a prototype via [`Optimizer::clone_box`].
//! Each instance therefore serves at most one matrix and one vector, which is
//! what lets the moment buffers live inside it.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Per-tensor weight update strategy
pub trait Optimizer: Send + Sync {
    /// Update a weight matrix given its gradients
    fn update_weights(&mut self, weights: &mut Array2<f64>, gradients: &Array2<f64>);

    /// Update a bias/weight vector given its gradients
    fn update_biases(&mut self, biases: &mut Array1<f64>, gradients: &Array1<f64>);

    /// Reset optimizer state (for a new training run)
    fn reset(&mut self);

    /// Clone the optimizer for each parameter tensor
    fn clone_box(&self) -> Box<dyn Optimizer>;
}

/// Plain stochastic gradient descent
#[derive(Clone, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn update_weights(&mut self, weights: &mut Array2<f64>, gradients: &Array2<f64>) {
        *weights = &*weights - &(gradients * self.learning_rate);
    }

    fn update_biases(&mut self, biases: &mut Array1<f64>, gradients: &Array1<f64>) {
        *biases = &*biases - &(gradients * self.learning_rate);
    }

    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn Optimizer> {
        Box::new(self.clone())
    }
}

/// Adam (Adaptive Moment Estimation): per-parameter learning rates from
/// bias-corrected first and second moment estimates
#[derive(Clone, Serialize, Deserialize)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    #[serde(skip)]
    t_w: usize,
    #[serde(skip)]
    m_w: Option<Array2<f64>>,
    #[serde(skip)]
    v_w: Option<Array2<f64>>,
    #[serde(skip)]
    t_b: usize,
    #[serde(skip)]
    m_b: Option<Array1<f64>>,
    #[serde(skip)]
    v_b: Option<Array1<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t_w: 0,
            m_w: None,
            v_w: None,
            t_b: 0,
            m_b: None,
            v_b: None,
        }
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }
}

impl Optimizer for Adam {
    fn update_weights(&mut self, weights: &mut Array2<f64>, gradients: &Array2<f64>) {
        self.t_w += 1;

        let m = self.m_w.get_or_insert_with(|| Array2::zeros(weights.dim()));
        let v = self.v_w.get_or_insert_with(|| Array2::zeros(weights.dim()));

        *m = &*m * self.beta1 + gradients * (1.0 - self.beta1);
        *v = &*v * self.beta2 + &(gradients * gradients) * (1.0 - self.beta2);

        let m_hat = &*m / (1.0 - self.beta1.powi(self.t_w as i32));
        let v_hat = &*v / (1.0 - self.beta2.powi(self.t_w as i32));

        *weights =
            &*weights - &(&m_hat * self.learning_rate / &(v_hat.mapv(f64::sqrt) + self.epsilon));
    }

    fn update_biases(&mut self, biases: &mut Array1<f64>, gradients: &Array1<f64>) {
        self.t_b += 1;

        let m = self.m_b.get_or_insert_with(|| Array1::zeros(biases.len()));
        let v = self.v_b.get_or_insert_with(|| Array1::zeros(biases.len()));

        *m = &*m * self.beta1 + gradients * (1.0 - self.beta1);
        *v = &*v * self.beta2 + &(gradients * gradients) * (1.0 - self.beta2);

        let m_hat = &*m / (1.0 - self.beta1.powi(self.t_b as i32));
        let v_hat = &*v / (1.0 - self.beta2.powi(self.t_b as i32));

        *biases =
            &*biases - &(&m_hat * self.learning_rate / &(v_hat.mapv(f64::sqrt) + self.epsilon));
    }

    fn reset(&mut self) {
        self.t_w = 0;
        self.m_w = None;
        self.v_w = None;
        self.t_b = 0;
        self.m_b = None;
        self.v_b = None;
    }

    fn clone_box(&self) -> Box<dyn Optimizer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sgd_update() {
        let mut optimizer = Sgd::new(0.01);
        let mut weights = Array2::ones((3, 2));
        let gradients = Array2::ones((3, 2));
        optimizer.update_weights(&mut weights, &gradients);

        assert!((weights[[0, 0]] - 0.99).abs() < 1e-10);
    }

    #[test]
    fn test_adam_moves_against_gradient() {
        let mut optimizer = Adam::new(0.001);
        let mut weights = Array2::ones((3, 2));
        let gradients = Array2::ones((3, 2));

        for _ in 0..10 {
            optimizer.update_weights(&mut weights, &gradients);
        }

        assert!(weights[[0, 0]] < 1.0);
    }

    #[test]
    fn test_adam_bias_only_instance() {
        // vector updates must bias-correct with their own step counter
        let mut optimizer = Adam::new(0.001);
        let mut biases = Array1::zeros(4);
        let gradients = Array1::ones(4);

        optimizer.update_biases(&mut biases, &gradients);

        assert!(biases.iter().all(|b| b.is_finite()));
        assert!(biases[0] < 0.0);
    }

    #[test]
    fn test_reset_clears_moments() {
        let mut optimizer = Adam::new(0.001);
        let mut weights = Array2::ones((2, 2));
        let gradients = Array2::ones((2, 2));
        optimizer.update_weights(&mut weights, &gradients);

        optimizer.reset();
        let after_reset = weights.clone();
        optimizer.update_weights(&mut weights, &gradients);

        // first post-reset step behaves like a fresh optimizer step
        assert!((after_reset[[0, 0]] - weights[[0, 0]]).abs() > 0.0);
    }
}
