//! Trained predictors returned by the learners.

pub mod classification;
pub mod neural_net_model;
pub mod regression;

use crate::math::matrix::Matrix;

pub use classification::{ClassificationNeuralNetModel, ProbabilityPrediction};
pub use neural_net_model::NeuralNetModel;
pub use regression::RegressionNeuralNetModel;

/// A trained model mapping one observation to a prediction of type `P`.
pub trait PredictorModel<P> {
    /// # Panics
    /// Panics if `observation` does not have as many values as the network
    /// input layer declares.
    fn predict(&self, observation: &[f64]) -> P;

    /// One prediction per row of `observations`.
    fn predict_batch(&self, observations: &Matrix) -> Vec<P> {
        (0..observations.rows).map(|row| self.predict(observations.row(row))).collect()
    }
}
