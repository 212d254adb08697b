use std::sync::mpsc;

use crate::encoders::{ordered_classes, TargetEncoding};
use crate::error::Result;
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::models::{ClassificationNeuralNetModel, ProbabilityPrediction};
use crate::network::network::NeuralNet;
use crate::train::{EpochStats, NeuralNetLearner, NeuralNetLearnerConfig};

use super::{IndexedLearner, Learner};

/// Trains a network ending in a `SoftmaxLayer` on one-of-N encoded targets.
#[derive(Debug, Clone)]
pub struct ClassificationNeuralNetLearner {
    learner: NeuralNetLearner,
}

impl ClassificationNeuralNetLearner {
    /// Fails with `MissingCapability` unless the last layer is a
    /// classification head.
    pub fn new(net: NeuralNet, loss: LossType, config: NeuralNetLearnerConfig) -> Result<Self> {
        net.require_classification()?;
        let learner = NeuralNetLearner::new(net, TargetEncoding::OneOfN, loss, config)?;
        Ok(ClassificationNeuralNetLearner { learner })
    }

    pub fn with_progress(self, tx: mpsc::Sender<EpochStats>) -> Self {
        ClassificationNeuralNetLearner { learner: self.learner.with_progress(tx) }
    }

    pub fn learner(&self) -> &NeuralNetLearner {
        &self.learner
    }

    pub fn learn(&self, observations: &Matrix, targets: &[f64]) -> Result<ClassificationNeuralNetModel> {
        let indices: Vec<usize> = (0..targets.len()).collect();
        self.learn_indices(observations, targets, &indices)
    }

    pub fn learn_indices(
        &self,
        observations: &Matrix,
        targets: &[f64],
        indices: &[usize],
    ) -> Result<ClassificationNeuralNetModel> {
        let model = self.learner.learn(observations, targets, indices)?;
        Ok(ClassificationNeuralNetModel::new(model, ordered_classes(targets)))
    }
}

impl Learner<f64> for ClassificationNeuralNetLearner {
    type Model = ClassificationNeuralNetModel;

    fn learn(&self, observations: &Matrix, targets: &[f64]) -> Result<Self::Model> {
        ClassificationNeuralNetLearner::learn(self, observations, targets)
    }
}

impl Learner<ProbabilityPrediction> for ClassificationNeuralNetLearner {
    type Model = ClassificationNeuralNetModel;

    fn learn(&self, observations: &Matrix, targets: &[f64]) -> Result<Self::Model> {
        ClassificationNeuralNetLearner::learn(self, observations, targets)
    }
}

impl IndexedLearner<f64> for ClassificationNeuralNetLearner {
    type Model = ClassificationNeuralNetModel;

    fn learn_indices(&self, observations: &Matrix, targets: &[f64], indices: &[usize]) -> Result<Self::Model> {
        ClassificationNeuralNetLearner::learn_indices(self, observations, targets, indices)
    }
}

impl IndexedLearner<ProbabilityPrediction> for ClassificationNeuralNetLearner {
    type Model = ClassificationNeuralNetModel;

    fn learn_indices(&self, observations: &Matrix, targets: &[f64], indices: &[usize]) -> Result<Self::Model> {
        ClassificationNeuralNetLearner::learn_indices(self, observations, targets, indices)
    }
}
