use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::models::neural_net_model::NeuralNetModel;
use crate::models::PredictorModel;

/// Predicted class together with the probability of every class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityPrediction {
    pub prediction: f64,
    /// `(class, probability)` pairs in ascending class order.
    pub probabilities: Vec<(f64, f64)>,
}

/// Softmax-headed network plus the ordered class values it was trained on.
/// Output column `i` is the probability of `classes[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationNeuralNetModel {
    model: NeuralNetModel,
    classes: Vec<f64>,
}

impl ClassificationNeuralNetModel {
    pub fn new(model: NeuralNetModel, classes: Vec<f64>) -> ClassificationNeuralNetModel {
        ClassificationNeuralNetModel { model, classes }
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn model(&self) -> &NeuralNetModel {
        &self.model
    }

    pub fn predict_probability(&self, observation: &[f64]) -> ProbabilityPrediction {
        let probabilities = self.model.predict(observation);
        self.to_prediction(&probabilities)
    }

    pub fn predict_probability_batch(&self, observations: &Matrix) -> Vec<ProbabilityPrediction> {
        let outputs = self.model.predict_batch(observations);
        (0..outputs.rows).map(|row| self.to_prediction(outputs.row(row))).collect()
    }

    fn to_prediction(&self, probabilities: &[f64]) -> ProbabilityPrediction {
        ProbabilityPrediction {
            prediction: self.decode(probabilities),
            probabilities: self.classes.iter().copied().zip(probabilities.iter().copied()).collect(),
        }
    }

    // first maximum wins
    fn decode(&self, probabilities: &[f64]) -> f64 {
        let mut best = 0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > probabilities[best] {
                best = i;
            }
        }
        self.classes[best]
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load_json(path: &str) -> Result<ClassificationNeuralNetModel> {
        let file = std::fs::File::open(path)?;
        let mut model: ClassificationNeuralNetModel = serde_json::from_reader(std::io::BufReader::new(file))?;
        model.model.restore_buffers();
        Ok(model)
    }
}

impl PredictorModel<f64> for ClassificationNeuralNetModel {
    fn predict(&self, observation: &[f64]) -> f64 {
        self.decode(&self.model.predict(observation))
    }

    fn predict_batch(&self, observations: &Matrix) -> Vec<f64> {
        let outputs = self.model.predict_batch(observations);
        (0..outputs.rows).map(|row| self.decode(outputs.row(row))).collect()
    }
}

impl PredictorModel<ProbabilityPrediction> for ClassificationNeuralNetModel {
    fn predict(&self, observation: &[f64]) -> ProbabilityPrediction {
        self.predict_probability(observation)
    }

    fn predict_batch(&self, observations: &Matrix) -> Vec<ProbabilityPrediction> {
        self.predict_probability_batch(observations)
    }
}
