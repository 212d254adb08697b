//! Learners that turn observations and targets into trained models.

pub mod classification;
pub mod regression;

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::models::PredictorModel;

pub use classification::ClassificationNeuralNetLearner;
pub use regression::RegressionNeuralNetLearner;

/// Trains a model on every row of `observations`.
pub trait Learner<P> {
    type Model: PredictorModel<P>;

    fn learn(&self, observations: &Matrix, targets: &[f64]) -> Result<Self::Model>;
}

/// Trains a model on the rows of `observations` selected by `indices`.
pub trait IndexedLearner<P> {
    type Model: PredictorModel<P>;

    fn learn_indices(&self, observations: &Matrix, targets: &[f64], indices: &[usize]) -> Result<Self::Model>;
}
