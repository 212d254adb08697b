use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::layers::shape::LayerShape;
use crate::layers::ShapeResult;
use crate::math::matrix::Matrix;

/// Applies an `ActivationFunction` element-wise; the shape is unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationLayer {
    pub function: ActivationFunction,
    shape: LayerShape,
    // pre-activation values of the latest forward pass
    #[serde(skip)]
    input: Matrix,
}

impl ActivationLayer {
    pub fn new(function: ActivationFunction) -> ActivationLayer {
        ActivationLayer { function, shape: LayerShape::default(), input: Matrix::default() }
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        Ok(input)
    }

    pub fn initialize(&mut self, input: LayerShape, batch_size: usize) -> ShapeResult {
        self.shape = input;
        self.set_batch_size(batch_size);
        Ok(input)
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.input = Matrix::zeros(batch_size, self.shape.units());
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        self.input.copy_from(input);
        self.predict(input)
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        let f = self.function;
        let mut output = input.clone();
        output.data.par_chunks_mut(input.cols.max(1)).for_each(|row| {
            row.iter_mut().for_each(|v| *v = f.function(*v));
        });
        output
    }

    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        let f = self.function;
        let cols = output_gradient.cols.max(1);
        let mut input_gradient = output_gradient.clone();
        input_gradient
            .data
            .par_chunks_mut(cols)
            .zip(self.input.data.par_chunks(cols))
            .for_each(|(g, x)| {
                g.iter_mut().zip(x).for_each(|(g, &x)| *g *= f.derivative(x));
            });
        input_gradient
    }

    pub fn copy_for_prediction(&self) -> ActivationLayer {
        let mut copy = ActivationLayer::new(self.function);
        copy.shape = self.shape;
        copy
    }
}
