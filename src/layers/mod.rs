//! The closed set of layer kinds a `NeuralNet` can stack.
//!
//! `Layer` is a sum type over the concrete layers; every operation is
//! dispatched with an exhaustive `match`, so adding a variant fails to
//! compile until each operation handles it.

pub mod shape;
pub mod input;
pub mod dense;
pub mod conv2d;
pub mod max_pool;
pub mod activation;
pub mod dropout;
pub mod batch_norm;
pub mod softmax;
pub mod regression;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NeuralNetError, Result};
use crate::math::matrix::Matrix;

pub use activation::ActivationLayer;
pub use batch_norm::BatchNormLayer;
pub use conv2d::Conv2DLayer;
pub use dense::DenseLayer;
pub use dropout::DropoutLayer;
pub use input::InputLayer;
pub use max_pool::{MaxPoolLayer, Switch};
pub use regression::SquaredErrorRegressionLayer;
pub use shape::LayerShape;
pub use softmax::SoftmaxLayer;

/// Output shape of a layer, or why it cannot accept its input.
pub type ShapeResult = std::result::Result<LayerShape, String>;

/// Read-only view of a layer's trainable tensors (or their gradients).
#[derive(Debug, Clone, Copy)]
pub struct WeightsAndBiases<'a> {
    pub weights: &'a Matrix,
    pub biases: &'a [f64],
}

/// One trainable tensor paired with its gradient, as handed to the optimizer.
///
/// `decay` is false for bias-like tensors, which are excluded from L1/L2
/// regularization.
#[derive(Debug)]
pub struct ParametersAndGradients<'a> {
    pub parameters: &'a mut [f64],
    pub gradients: &'a [f64],
    pub decay: bool,
}

impl<'a> ParametersAndGradients<'a> {
    pub fn weights(parameters: &'a mut [f64], gradients: &'a [f64]) -> Self {
        ParametersAndGradients { parameters, gradients, decay: true }
    }

    pub fn biases(parameters: &'a mut [f64], gradients: &'a [f64]) -> Self {
        ParametersAndGradients { parameters, gradients, decay: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Layer {
    Input(InputLayer),
    Dense(DenseLayer),
    Conv2D(Conv2DLayer),
    MaxPool(MaxPoolLayer),
    Activation(ActivationLayer),
    Dropout(DropoutLayer),
    BatchNorm(BatchNormLayer),
    Softmax(SoftmaxLayer),
    SquaredErrorRegression(SquaredErrorRegressionLayer),
}

macro_rules! dispatch {
    ($layer:expr, $inner:ident => $body:expr) => {
        match $layer {
            Layer::Input($inner) => $body,
            Layer::Dense($inner) => $body,
            Layer::Conv2D($inner) => $body,
            Layer::MaxPool($inner) => $body,
            Layer::Activation($inner) => $body,
            Layer::Dropout($inner) => $body,
            Layer::BatchNorm($inner) => $body,
            Layer::Softmax($inner) => $body,
            Layer::SquaredErrorRegression($inner) => $body,
        }
    };
}

impl Layer {
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Input(_) => "Input",
            Layer::Dense(_) => "Dense",
            Layer::Conv2D(_) => "Conv2D",
            Layer::MaxPool(_) => "MaxPool",
            Layer::Activation(_) => "Activation",
            Layer::Dropout(_) => "Dropout",
            Layer::BatchNorm(_) => "BatchNorm",
            Layer::Softmax(_) => "Softmax",
            Layer::SquaredErrorRegression(_) => "SquaredErrorRegression",
        }
    }

    /// Activation to append after this layer, if any.
    pub fn activation(&self) -> Option<ActivationFunction> {
        let function = match self {
            Layer::Dense(l) => l.activation,
            Layer::Conv2D(l) => l.activation,
            _ => return None,
        };
        (function != ActivationFunction::Identity).then_some(function)
    }

    pub fn is_classification_head(&self) -> bool {
        matches!(self, Layer::Softmax(_))
    }

    pub fn is_regression_head(&self) -> bool {
        matches!(self, Layer::SquaredErrorRegression(_))
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        dispatch!(self, l => l.output_shape(input))
    }

    /// Binds shapes, allocates buffers for `batch_size` samples and draws
    /// fresh weights from `rng`.
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        input: LayerShape,
        batch_size: usize,
        rng: &mut R,
    ) -> ShapeResult {
        match self {
            Layer::Input(l) => l.output_shape(input),
            Layer::Dense(l) => l.initialize(input, batch_size, rng),
            Layer::Conv2D(l) => l.initialize(input, batch_size, rng),
            Layer::MaxPool(l) => l.initialize(input, batch_size, rng),
            Layer::Activation(l) => l.initialize(input, batch_size),
            Layer::Dropout(l) => l.initialize(input, batch_size, rng),
            Layer::BatchNorm(l) => l.initialize(input, batch_size),
            Layer::Softmax(l) => l.initialize(input, batch_size, rng),
            Layer::SquaredErrorRegression(l) => l.initialize(input, batch_size, rng),
        }
    }

    /// Reallocates batch-dependent buffers; trained weights are kept.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        match self {
            Layer::Input(_) => {}
            Layer::Dense(l) => l.set_batch_size(batch_size),
            Layer::Conv2D(l) => l.set_batch_size(batch_size),
            Layer::MaxPool(l) => l.set_batch_size(batch_size),
            Layer::Activation(l) => l.set_batch_size(batch_size),
            Layer::Dropout(l) => l.set_batch_size(batch_size),
            Layer::BatchNorm(l) => l.set_batch_size(batch_size),
            Layer::Softmax(l) => l.set_batch_size(batch_size),
            Layer::SquaredErrorRegression(l) => l.set_batch_size(batch_size),
        }
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        dispatch!(self, l => l.forward(input))
    }

    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        dispatch!(self, l => l.backward(output_gradient))
    }

    /// Inference pass; leaves every training cache untouched.
    pub fn predict(&self, input: &Matrix) -> Matrix {
        dispatch!(self, l => l.predict(input))
    }

    pub fn parameters(&self) -> Result<WeightsAndBiases<'_>> {
        let found = match self {
            Layer::Dense(l) => Some(l.parameters()),
            Layer::Conv2D(l) => Some(l.parameters()),
            Layer::BatchNorm(l) => Some(l.parameters()),
            Layer::Softmax(l) => Some(l.parameters()),
            Layer::SquaredErrorRegression(l) => Some(l.parameters()),
            Layer::Input(_) | Layer::MaxPool(_) | Layer::Activation(_) | Layer::Dropout(_) => None,
        };
        found.ok_or(NeuralNetError::NotApplicable { layer: self.name() })
    }

    pub fn gradients(&self) -> Result<WeightsAndBiases<'_>> {
        let found = match self {
            Layer::Dense(l) => Some(l.gradients()),
            Layer::Conv2D(l) => Some(l.gradients()),
            Layer::BatchNorm(l) => Some(l.gradients()),
            Layer::Softmax(l) => Some(l.gradients()),
            Layer::SquaredErrorRegression(l) => Some(l.gradients()),
            Layer::Input(_) | Layer::MaxPool(_) | Layer::Activation(_) | Layer::Dropout(_) => None,
        };
        found.ok_or(NeuralNetError::NotApplicable { layer: self.name() })
    }

    pub fn add_parameters_and_gradients<'a>(&'a mut self, collector: &mut Vec<ParametersAndGradients<'a>>) {
        match self {
            Layer::Dense(l) => l.add_parameters_and_gradients(collector),
            Layer::Conv2D(l) => l.add_parameters_and_gradients(collector),
            Layer::BatchNorm(l) => l.add_parameters_and_gradients(collector),
            Layer::Softmax(l) => l.add_parameters_and_gradients(collector),
            Layer::SquaredErrorRegression(l) => l.add_parameters_and_gradients(collector),
            Layer::Input(_) | Layer::MaxPool(_) | Layer::Activation(_) | Layer::Dropout(_) => {}
        }
    }

    /// Batch-size-1 copy holding only what inference needs.
    pub fn copy_for_prediction(&self) -> Layer {
        match self {
            Layer::Input(l) => Layer::Input(l.clone()),
            Layer::Dense(l) => Layer::Dense(l.copy_for_prediction()),
            Layer::Conv2D(l) => Layer::Conv2D(l.copy_for_prediction()),
            Layer::MaxPool(l) => Layer::MaxPool(l.copy_for_prediction()),
            Layer::Activation(l) => Layer::Activation(l.copy_for_prediction()),
            Layer::Dropout(l) => Layer::Dropout(l.copy_for_prediction()),
            Layer::BatchNorm(l) => Layer::BatchNorm(l.copy_for_prediction()),
            Layer::Softmax(l) => Layer::Softmax(l.copy_for_prediction()),
            Layer::SquaredErrorRegression(l) => Layer::SquaredErrorRegression(l.copy_for_prediction()),
        }
    }
}

macro_rules! impl_from_layer {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Layer {
                fn from(layer: $ty) -> Layer {
                    Layer::$variant(layer)
                }
            }
        )*
    };
}

impl_from_layer!(
    Input(InputLayer),
    Dense(DenseLayer),
    Conv2D(Conv2DLayer),
    MaxPool(MaxPoolLayer),
    Activation(ActivationLayer),
    Dropout(DropoutLayer),
    BatchNorm(BatchNormLayer),
    Softmax(SoftmaxLayer),
    SquaredErrorRegression(SquaredErrorRegressionLayer),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_free_layers_report_not_applicable() {
        let pool = Layer::from(MaxPoolLayer::new(2, 2, 2));
        match pool.parameters() {
            Err(NeuralNetError::NotApplicable { layer }) => assert_eq!(layer, "MaxPool"),
            other => panic!("expected NotApplicable, got {other:?}"),
        }
        assert!(Layer::from(ActivationLayer::new(ActivationFunction::ReLU)).gradients().is_err());
    }

    #[test]
    fn weighted_layers_carry_their_activation() {
        let dense = Layer::from(DenseLayer::new(4, ActivationFunction::ReLU));
        assert_eq!(dense.activation(), Some(ActivationFunction::ReLU));

        let linear = Layer::from(DenseLayer::new(4, ActivationFunction::Identity));
        assert_eq!(linear.activation(), None);
    }

    #[test]
    fn heads_expose_capabilities() {
        assert!(Layer::from(SoftmaxLayer::new(3)).is_classification_head());
        assert!(Layer::from(SquaredErrorRegressionLayer::new(1)).is_regression_head());
        assert!(!Layer::from(DenseLayer::new(1, ActivationFunction::Identity)).is_regression_head());
    }
}
