use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::layers::dense::DenseLayer;
use crate::layers::shape::LayerShape;
use crate::layers::{ParametersAndGradients, ShapeResult, WeightsAndBiases};
use crate::math::matrix::Matrix;

/// Classification head: a fully connected layer with one unit per class
/// followed by a row-wise softmax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxLayer {
    pub classes: usize,
    pub linear: DenseLayer,
    #[serde(skip)]
    probabilities: Matrix,
}

/// Numerically stable softmax of every row.
pub fn softmax_rows(logits: &Matrix) -> Matrix {
    let mut out = logits.clone();
    out.data.par_chunks_mut(logits.cols.max(1)).for_each(|row| {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for v in row.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        row.iter_mut().for_each(|v| *v /= sum);
    });
    out
}

impl SoftmaxLayer {
    pub fn new(classes: usize) -> SoftmaxLayer {
        SoftmaxLayer {
            classes,
            linear: DenseLayer::new(classes, ActivationFunction::Identity),
            probabilities: Matrix::default(),
        }
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        if self.classes < 2 {
            return Err(format!("softmax needs at least two classes, got {}", self.classes));
        }
        self.linear.output_shape(input)
    }

    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        input: LayerShape,
        batch_size: usize,
        rng: &mut R,
    ) -> ShapeResult {
        self.output_shape(input)?;
        let output = self.linear.initialize(input, batch_size, rng)?;
        self.set_batch_size(batch_size);
        Ok(output)
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.linear.set_batch_size(batch_size);
        self.probabilities = Matrix::zeros(batch_size, self.classes);
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let probabilities = softmax_rows(&self.linear.forward(input));
        self.probabilities = probabilities.clone();
        probabilities
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        softmax_rows(&self.linear.predict(input))
    }

    /// Softmax Jacobian-vector product, then the linear backward pass:
    /// `dz_i = p_i * (g_i - Σ_j g_j p_j)`.
    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        let cols = self.classes;
        let mut logit_gradient = output_gradient.clone();
        logit_gradient
            .data
            .par_chunks_mut(cols)
            .zip(self.probabilities.data.par_chunks(cols))
            .for_each(|(g, p)| {
                let dot: f64 = g.iter().zip(p).map(|(g, p)| g * p).sum();
                g.iter_mut().zip(p).for_each(|(g, p)| *g = p * (*g - dot));
            });
        self.linear.backward(&logit_gradient)
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

    pub fn copy_for_prediction(&self) -> SoftmaxLayer {
        SoftmaxLayer {
            classes: self.classes,
            linear: self.linear.copy_for_prediction(),
            probabilities: Matrix::zeros(1, self.classes),
        }
    }
}
