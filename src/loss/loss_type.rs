use serde::{Serialize, Deserialize};

use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::huber::HuberLoss;
use crate::loss::mae::MaeLoss;
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;

/// Selects which loss function the training loop uses.
///
/// - `Mse`         : half squared error; pair with a regression head.
/// - `CrossEntropy`: categorical cross-entropy; pair with a Softmax head.
/// - `Mae`         : absolute error; pair with a regression head.
/// - `Huber`       : Huber loss (δ=1.0); pair with a regression head.
///
/// Every variant averages over batch rows and returns the exact gradient
/// of the value it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    CrossEntropy,
    Mae,
    Huber,
}

impl LossType {
    pub fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        match self {
            LossType::Mse          => MseLoss::loss(predicted, expected),
            LossType::CrossEntropy => CrossEntropyLoss::loss(predicted, expected),
            LossType::Mae          => MaeLoss::loss(predicted, expected),
            LossType::Huber        => HuberLoss::loss(predicted, expected),
        }
    }

    /// Gradient of `loss` with respect to `predicted`, same shape.
    pub fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        match self {
            LossType::Mse          => MseLoss::derivative(predicted, expected),
            LossType::CrossEntropy => CrossEntropyLoss::derivative(predicted, expected),
            LossType::Mae          => MaeLoss::derivative(predicted, expected),
            LossType::Huber        => HuberLoss::derivative(predicted, expected),
        }
    }
}
