use std::sync::mpsc;

use crate::encoders::TargetEncoding;
use crate::error::Result;
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::models::RegressionNeuralNetModel;
use crate::network::network::NeuralNet;
use crate::train::{EpochStats, NeuralNetLearner, NeuralNetLearnerConfig};

use super::{IndexedLearner, Learner};

/// Trains a network ending in a `SquaredErrorRegressionLayer` on raw targets.
#[derive(Debug, Clone)]
pub struct RegressionNeuralNetLearner {
    learner: NeuralNetLearner,
}

impl RegressionNeuralNetLearner {
    /// Fails with `MissingCapability` unless the last layer is a regression
    /// head.
    pub fn new(net: NeuralNet, loss: LossType, config: NeuralNetLearnerConfig) -> Result<Self> {
        net.require_regression()?;
        let learner = NeuralNetLearner::new(net, TargetEncoding::Copy, loss, config)?;
        Ok(RegressionNeuralNetLearner { learner })
    }

    pub fn with_progress(self, tx: mpsc::Sender<EpochStats>) -> Self {
        RegressionNeuralNetLearner { learner: self.learner.with_progress(tx) }
    }

    pub fn learner(&self) -> &NeuralNetLearner {
        &self.learner
    }

    pub fn learn(&self, observations: &Matrix, targets: &[f64]) -> Result<RegressionNeuralNetModel> {
        let indices: Vec<usize> = (0..targets.len()).collect();
        self.learn_indices(observations, targets, &indices)
    }

    pub fn learn_indices(
        &self,
        observations: &Matrix,
        targets: &[f64],
        indices: &[usize],
    ) -> Result<RegressionNeuralNetModel> {
        Ok(RegressionNeuralNetModel::new(self.learner.learn(observations, targets, indices)?))
    }
}

impl Learner<f64> for RegressionNeuralNetLearner {
    type Model = RegressionNeuralNetModel;

    fn learn(&self, observations: &Matrix, targets: &[f64]) -> Result<Self::Model> {
        RegressionNeuralNetLearner::learn(self, observations, targets)
    }
}

impl IndexedLearner<f64> for RegressionNeuralNetLearner {
    type Model = RegressionNeuralNetModel;

    fn learn_indices(&self, observations: &Matrix, targets: &[f64], indices: &[usize]) -> Result<Self::Model> {
        RegressionNeuralNetLearner::learn_indices(self, observations, targets, indices)
    }
}
