use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Element-wise activation applied by an `ActivationLayer`.
///
/// Weighted layers (`DenseLayer`, `Conv2DLayer`) carry one of these as a
/// hyperparameter; `NeuralNet::add` appends the matching activation layer
/// after them unless it is `Identity`. Softmax is not here: it is a
/// row-wise operation owned by the classification head.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Identity,
    Sigmoid,
    ReLU,
    Tanh,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

// tanh approximation of GELU
const GELU_CUBIC: f64 = 0.044715;

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn gelu_inner(x: f64) -> f64 {
    (2.0 / PI).sqrt() * (x + GELU_CUBIC * x * x * x)
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match *self {
            ActivationFunction::Identity => x,
            ActivationFunction::Sigmoid => logistic(x),
            ActivationFunction::ReLU => x.max(0.0),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => if x > 0.0 { x } else { alpha * x.exp_m1() },
            ActivationFunction::Gelu => 0.5 * x * (1.0 + gelu_inner(x).tanh()),
            ActivationFunction::Swish => x * logistic(x),
        }
    }

    /// Derivative evaluated at the pre-activation input `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match *self {
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Sigmoid => {
                let s = logistic(x);
                s * (1.0 - s)
            }
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Tanh => 1.0 - x.tanh().powi(2),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { alpha },
            ActivationFunction::Elu { alpha } => if x > 0.0 { 1.0 } else { alpha * x.exp() },
            ActivationFunction::Gelu => {
                let t = gelu_inner(x).tanh();
                let d_inner = (2.0 / PI).sqrt() * (1.0 + 3.0 * GELU_CUBIC * x * x);
                0.5 * (1.0 + t) + 0.5 * x * (1.0 - t * t) * d_inner
            }
            ActivationFunction::Swish => {
                let s = logistic(x);
                s * (1.0 + x * (1.0 - s))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derivatives_match_central_differences() {
        let functions = [
            ActivationFunction::Sigmoid,
            ActivationFunction::Tanh,
            ActivationFunction::LeakyReLU { alpha: 0.1 },
            ActivationFunction::Elu { alpha: 1.0 },
            ActivationFunction::Gelu,
            ActivationFunction::Swish,
        ];
        let h = 1e-6;
        for f in functions {
            for &x in &[-2.3, -0.7, 0.4, 1.9] {
                let numeric = (f.function(x + h) - f.function(x - h)) / (2.0 * h);
                assert_relative_eq!(f.derivative(x), numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn relu_clamps_negatives() {
        let relu = ActivationFunction::ReLU;
        assert_eq!(relu.function(-3.0), 0.0);
        assert_eq!(relu.function(2.5), 2.5);
        assert_eq!(relu.derivative(-3.0), 0.0);
        assert_eq!(relu.derivative(2.5), 1.0);
    }
}
