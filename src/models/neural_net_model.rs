use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::network::NeuralNet;

/// Raw-output model: a trained network in inference mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetModel {
    net: NeuralNet,
}

impl NeuralNetModel {
    pub fn new(net: NeuralNet) -> NeuralNetModel {
        NeuralNetModel { net }
    }

    pub fn net(&self) -> &NeuralNet {
        &self.net
    }

    // per-batch caches are not serialized
    pub(crate) fn restore_buffers(&mut self) {
        let batch_size = self.net.batch_size().max(1);
        self.net.set_batch_size(batch_size);
    }

    /// Output units for a single observation.
    pub fn predict(&self, observation: &[f64]) -> Vec<f64> {
        let input = Matrix::from_vec(1, observation.len(), observation.to_vec());
        self.net.predict(&input).data
    }

    /// Output matrix for a batch, one row per observation.
    pub fn predict_batch(&self, observations: &Matrix) -> Matrix {
        self.net.predict(observations)
    }

    /// Serializes the model to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        self.net.save_json(path)
    }

    /// Deserializes a model from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<NeuralNetModel> {
        Ok(NeuralNetModel { net: NeuralNet::load_json(path)? })
    }
}
