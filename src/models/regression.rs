use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::models::neural_net_model::NeuralNetModel;
use crate::models::PredictorModel;

/// Network with a single-output regression head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionNeuralNetModel {
    model: NeuralNetModel,
}

impl RegressionNeuralNetModel {
    pub fn new(model: NeuralNetModel) -> RegressionNeuralNetModel {
        RegressionNeuralNetModel { model }
    }

    pub fn model(&self) -> &NeuralNetModel {
        &self.model
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        self.model.save_json(path)
    }

    pub fn load_json(path: &str) -> Result<RegressionNeuralNetModel> {
        Ok(RegressionNeuralNetModel { model: NeuralNetModel::load_json(path)? })
    }
}

impl PredictorModel<f64> for RegressionNeuralNetModel {
    fn predict(&self, observation: &[f64]) -> f64 {
        self.model.predict(observation)[0]
    }

    fn predict_batch(&self, observations: &Matrix) -> Vec<f64> {
        self.model.predict_batch(observations).data
    }
}
