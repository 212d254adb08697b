use serde::{Serialize, Deserialize};

use crate::layers::shape::LayerShape;
use crate::layers::ShapeResult;
use crate::math::matrix::Matrix;

/// First layer of every network: declares the shape of one observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputLayer {
    pub shape: LayerShape,
}

impl InputLayer {
    pub fn new(width: usize, height: usize, depth: usize) -> InputLayer {
        InputLayer { shape: LayerShape::new(width, height, depth) }
    }

    /// Input of `units` plain features.
    pub fn flat(units: usize) -> InputLayer {
        InputLayer { shape: LayerShape::flat(units) }
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        if self.shape.units() == 0 {
            return Err("input layer must declare at least one feature".to_string());
        }
        if input.units() != self.shape.units() {
            return Err(format!(
                "input layer declares {} ({} features), received {} features",
                self.shape, self.shape.units(), input.units()
            ));
        }
        Ok(self.shape)
    }

    pub fn forward(&self, input: &Matrix) -> Matrix {
        self.predict(input)
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        assert_eq!(input.cols, self.shape.units(), "input layer expects {} features", self.shape.units());
        input.clone()
    }

    pub fn backward(&self, output_gradient: &Matrix) -> Matrix {
        output_gradient.clone()
    }
}
