use serde::{Serialize, Deserialize};

use crate::error::{NeuralNetError, Result};
use crate::optim::optimizer_method::OptimizerMethod;

/// Hyperparameters of a `NeuralNetLearner` run.
///
/// # Fields
/// - `iterations`      : full passes over the training indices
/// - `learning_rate`   : step size (ignored by `Adadelta`)
/// - `batch_size`      : samples per mini-batch; clamped to the sample count
/// - `l1decay`         : L1 penalty added to weight gradients
/// - `l2decay`         : L2 penalty added to weight gradients
/// - `optimizer_method`: update rule
/// - `momentum`        : `Momentum` / `Nesterov` velocity decay
/// - `ro`              : `RmsProp` / `Adadelta` accumulator decay
/// - `beta1`, `beta2`  : `Adam` / `AdaMax` moment decays
/// - `seed`            : seeds weight initialization, dropout and shuffling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralNetLearnerConfig {
    pub iterations: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub l1decay: f64,
    pub l2decay: f64,
    pub optimizer_method: OptimizerMethod,
    pub momentum: f64,
    pub ro: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub seed: u64,
}

impl Default for NeuralNetLearnerConfig {
    fn default() -> Self {
        NeuralNetLearnerConfig {
            iterations: 100,
            learning_rate: 0.01,
            batch_size: 128,
            l1decay: 0.0,
            l2decay: 0.0,
            optimizer_method: OptimizerMethod::Adagrad,
            momentum: 0.9,
            ro: 0.95,
            beta1: 0.9,
            beta2: 0.999,
            seed: 42,
        }
    }
}

impl NeuralNetLearnerConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(NeuralNetError::InvalidConfiguration(message.to_string()));
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid("learning_rate must be a positive number");
        }
        if self.l1decay < 0.0 || self.l2decay < 0.0 {
            return invalid("l1decay and l2decay must not be negative");
        }
        for (name, value) in [("momentum", self.momentum), ("ro", self.ro), ("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&value) {
                return Err(NeuralNetError::InvalidConfiguration(format!("{name} must be in [0, 1), was {value}")));
            }
        }
        Ok(())
    }
}
