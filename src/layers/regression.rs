use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::layers::dense::DenseLayer;
use crate::layers::shape::LayerShape;
use crate::layers::{ParametersAndGradients, ShapeResult, WeightsAndBiases};
use crate::math::matrix::Matrix;

/// Regression head: a fully connected layer with identity output, one unit
/// per regression target. Pair it with a squared-error loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquaredErrorRegressionLayer {
    pub targets: usize,
    pub linear: DenseLayer,
}

impl SquaredErrorRegressionLayer {
    pub fn new(targets: usize) -> SquaredErrorRegressionLayer {
        SquaredErrorRegressionLayer {
            targets,
            linear: DenseLayer::new(targets, ActivationFunction::Identity),
        }
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        self.linear.output_shape(input)
    }

    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        input: LayerShape,
        batch_size: usize,
        rng: &mut R,
    ) -> ShapeResult {
        self.linear.initialize(input, batch_size, rng)
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.linear.set_batch_size(batch_size);
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        self.linear.forward(input)
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        self.linear.predict(input)
    }

    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        self.linear.backward(output_gradient)
    }

    pub fn parameters(&self) -> WeightsAndBiases<'_> {
        self.linear.parameters()
    }

    pub fn gradients(&self) -> WeightsAndBiases<'_> {
        self.linear.gradients()
    }

    pub fn add_parameters_and_gradients<'a>(&'a mut self, collector: &mut Vec<ParametersAndGradients<'a>>) {
        self.linear.add_parameters_and_gradients(collector);
    }

    pub fn copy_for_prediction(&self) -> SquaredErrorRegressionLayer {
        SquaredErrorRegressionLayer {
            targets: self.targets,
            linear: self.linear.copy_for_prediction(),
        }
    }
}
