use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::layers::shape::LayerShape;
use crate::layers::{ParametersAndGradients, ShapeResult, WeightsAndBiases};
use crate::math::matrix::Matrix;

const EPSILON: f64 = 1e-5;

/// Batch normalization per channel (depth slice).
///
/// Statistics are taken over every batch item and every spatial position of
/// a channel. `scale` (γ) is stored as a 1 x depth matrix so it travels with
/// the other weight tensors; `shift` (β) is the bias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchNormLayer {
    pub momentum: f64,
    pub scale: Matrix,
    pub shift: Vec<f64>,
    pub scale_gradients: Matrix,
    pub shift_gradients: Vec<f64>,
    pub running_mean: Vec<f64>,
    pub running_variance: Vec<f64>,
    shape: LayerShape,
    #[serde(skip)]
    normalized: Matrix,
    #[serde(skip)]
    inverse_std: Vec<f64>,
}

impl BatchNormLayer {
    pub fn new() -> BatchNormLayer {
        BatchNormLayer::with_momentum(0.9)
    }

    pub fn with_momentum(momentum: f64) -> BatchNormLayer {
        BatchNormLayer {
            momentum,
            scale: Matrix::default(),
            shift: Vec::new(),
            scale_gradients: Matrix::default(),
            shift_gradients: Vec::new(),
            running_mean: Vec::new(),
            running_variance: Vec::new(),
            shape: LayerShape::default(),
            normalized: Matrix::default(),
            inverse_std: Vec::new(),
        }
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        if input.units() == 0 {
            return Err("batch normalization cannot take an empty input".to_string());
        }
        Ok(input)
    }

    pub fn initialize(&mut self, input: LayerShape, batch_size: usize) -> ShapeResult {
        let output = self.output_shape(input)?;
        let depth = input.depth;
        self.shape = input;
        self.scale = Matrix::from_vec(1, depth, vec![1.0; depth]);
        self.shift = vec![0.0; depth];
        self.scale_gradients = Matrix::zeros(1, depth);
        self.shift_gradients = vec![0.0; depth];
        self.running_mean = vec![0.0; depth];
        self.running_variance = vec![1.0; depth];
        self.set_batch_size(batch_size);
        Ok(output)
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.normalized = Matrix::zeros(batch_size, self.shape.units());
        self.inverse_std = vec![0.0; self.shape.depth];
    }

    fn plane(&self) -> usize {
        self.shape.width * self.shape.height
    }

    /// Per-channel sums of `f(value)` over all rows and spatial positions.
    fn channel_sums(&self, m: &Matrix, f: impl Fn(usize, f64) -> f64 + Sync) -> Vec<f64> {
        let plane = self.plane();
        (0..self.shape.depth)
            .into_par_iter()
            .map(|c| {
                let mut sum = 0.0;
                for r in 0..m.rows {
                    for v in &m.row(r)[c * plane..(c + 1) * plane] {
                        sum += f(c, *v);
                    }
                }
                sum
            })
            .collect()
    }

    fn normalize(&self, input: &Matrix, mean: &[f64], inverse_std: &[f64]) -> (Matrix, Matrix) {
        let plane = self.plane();
        let mut normalized = input.clone();
        let mut output = input.clone();
        normalized
            .data
            .par_chunks_mut(input.cols)
            .zip(output.data.par_chunks_mut(input.cols))
            .for_each(|(xhat, out)| {
                for (i, (xh, o)) in xhat.iter_mut().zip(out.iter_mut()).enumerate() {
                    let c = i / plane;
                    *xh = (*xh - mean[c]) * inverse_std[c];
                    *o = *xh * self.scale.data[c] + self.shift[c];
                }
            });
        (normalized, output)
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        assert_eq!(input.cols, self.shape.units(), "batch normalization expects {} inputs", self.shape.units());
        let count = (input.rows * self.plane()) as f64;
        let mean: Vec<f64> = self.channel_sums(input, |_, v| v).into_iter().map(|s| s / count).collect();
        let variance: Vec<f64> = self
            .channel_sums(input, |c, v| (v - mean[c]).powi(2))
            .into_iter()
            .map(|s| s / count)
            .collect();
        let inverse_std: Vec<f64> = variance.iter().map(|v| 1.0 / (v + EPSILON).sqrt()).collect();

        let (normalized, output) = self.normalize(input, &mean, &inverse_std);

        let m = self.momentum;
        for c in 0..self.shape.depth {
            self.running_mean[c] = m * self.running_mean[c] + (1.0 - m) * mean[c];
            self.running_variance[c] = m * self.running_variance[c] + (1.0 - m) * variance[c];
        }
        self.normalized = normalized;
        self.inverse_std = inverse_std;
        output
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        let inverse_std: Vec<f64> = self.running_variance.iter().map(|v| 1.0 / (v + EPSILON).sqrt()).collect();
        self.normalize(input, &self.running_mean, &inverse_std).1
    }

    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        let plane = self.plane();
        let count = (output_gradient.rows * plane) as f64;

        let sum_g = self.channel_sums(output_gradient, |_, g| g);
        // Σ g·x̂ needs both matrices, so walk them together
        let sum_gx: Vec<f64> = (0..self.shape.depth)
            .into_par_iter()
            .map(|c| {
                let mut sum = 0.0;
                for r in 0..output_gradient.rows {
                    let range = c * plane..(c + 1) * plane;
                    let g = &output_gradient.row(r)[range.clone()];
                    let xh = &self.normalized.row(r)[range];
                    sum += g.iter().zip(xh).map(|(g, x)| g * x).sum::<f64>();
                }
                sum
            })
            .collect();

        let mut input_gradient = output_gradient.clone();
        let cols = output_gradient.cols;
        let (scale, inverse_std) = (&self.scale.data, &self.inverse_std);
        input_gradient
            .data
            .par_chunks_mut(cols)
            .zip(self.normalized.data.par_chunks(cols))
            .for_each(|(dx, xhat)| {
                for (i, (d, xh)) in dx.iter_mut().zip(xhat).enumerate() {
                    let c = i / plane;
                    *d = scale[c] * inverse_std[c] / count * (count * *d - sum_g[c] - xh * sum_gx[c]);
                }
            });

        self.scale_gradients = Matrix::from_vec(1, self.shape.depth, sum_gx);
        self.shift_gradients = sum_g;
        input_gradient
    }

    pub fn parameters(&self) -> WeightsAndBiases<'_> {
        WeightsAndBiases { weights: &self.scale, biases: &self.shift }
    }

    pub fn gradients(&self) -> WeightsAndBiases<'_> {
        WeightsAndBiases { weights: &self.scale_gradients, biases: &self.shift_gradients }
    }

    pub fn add_parameters_and_gradients<'a>(&'a mut self, collector: &mut Vec<ParametersAndGradients<'a>>) {
        // scale and shift are not decayed
        collector.push(ParametersAndGradients::biases(&mut self.scale.data, &self.scale_gradients.data));
        collector.push(ParametersAndGradients::biases(&mut self.shift, &self.shift_gradients));
    }

    pub fn copy_for_prediction(&self) -> BatchNormLayer {
        let mut copy = BatchNormLayer::with_momentum(self.momentum);
        copy.shape = self.shape;
        copy.scale = self.scale.clone();
        copy.shift = self.shift.clone();
        copy.scale_gradients = Matrix::zeros(1, self.shape.depth);
        copy.shift_gradients = vec![0.0; self.shape.depth];
        copy.running_mean = self.running_mean.clone();
        copy.running_variance = self.running_variance.clone();
        copy.set_batch_size(1);
        copy
    }
}

impl Default for BatchNormLayer {
    fn default() -> Self {
        BatchNormLayer::new()
    }
}
