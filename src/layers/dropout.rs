use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::layers::shape::LayerShape;
use crate::layers::ShapeResult;
use crate::math::matrix::Matrix;

/// Inverted dropout: during training each unit is zeroed with probability
/// `drop_probability` and survivors are scaled by `1 / (1 - p)`, so
/// prediction is the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropoutLayer {
    pub drop_probability: f64,
    shape: LayerShape,
    #[serde(skip)]
    rng: Option<StdRng>,
    #[serde(skip)]
    mask: Matrix,
}

impl DropoutLayer {
    pub fn new(drop_probability: f64) -> DropoutLayer {
        DropoutLayer {
            drop_probability,
            shape: LayerShape::default(),
            rng: None,
            mask: Matrix::default(),
        }
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        if !(0.0..1.0).contains(&self.drop_probability) {
            return Err(format!("drop probability {} must lie in [0, 1)", self.drop_probability));
        }
        Ok(input)
    }

    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        input: LayerShape,
        batch_size: usize,
        rng: &mut R,
    ) -> ShapeResult {
        let output = self.output_shape(input)?;
        self.shape = input;
        self.rng = Some(StdRng::seed_from_u64(rng.gen()));
        self.set_batch_size(batch_size);
        Ok(output)
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.mask = Matrix::zeros(batch_size, self.shape.units());
    }

    /// Mask of the latest forward pass (0 or the survivor scale).
    pub fn mask(&self) -> &Matrix {
        &self.mask
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let keep = 1.0 - self.drop_probability;
        let scale = 1.0 / keep;
        let rng = self.rng.get_or_insert_with(|| StdRng::seed_from_u64(0));

        // masks are drawn sequentially so a seed reproduces them exactly
        let mut mask = Matrix::zeros(input.rows, input.cols);
        for m in mask.data.iter_mut() {
            *m = if rng.gen::<f64>() < keep { scale } else { 0.0 };
        }

        let mut output = input.clone();
        let cols = input.cols.max(1);
        output
            .data
            .par_chunks_mut(cols)
            .zip(mask.data.par_chunks(cols))
            .for_each(|(o, m)| o.iter_mut().zip(m).for_each(|(o, m)| *o *= m));
        self.mask = mask;
        output
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        input.clone()
    }

    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        let cols = output_gradient.cols.max(1);
        let mut input_gradient = output_gradient.clone();
        input_gradient
            .data
            .par_chunks_mut(cols)
            .zip(self.mask.data.par_chunks(cols))
            .for_each(|(g, m)| g.iter_mut().zip(m).for_each(|(g, m)| *g *= m));
        input_gradient
    }

    pub fn copy_for_prediction(&self) -> DropoutLayer {
        let mut copy = DropoutLayer::new(self.drop_probability);
        copy.shape = self.shape;
        copy
    }
}
