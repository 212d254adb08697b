use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::layers::shape::{filter_grid_length, LayerShape};
use crate::layers::{ParametersAndGradients, ShapeResult, WeightsAndBiases};
use crate::math::matrix::Matrix;

/// 2D convolution with zero padding.
///
/// `weights` holds one row per filter, laid out as
/// `(input depth, filter height, filter width)`. Output depth equals the
/// filter count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2DLayer {
    pub filter_width: usize,
    pub filter_height: usize,
    pub filter_count: usize,
    pub stride: usize,
    pub padding: usize,
    pub activation: ActivationFunction,
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub weight_gradients: Matrix,
    pub bias_gradients: Vec<f64>,
    input_shape: LayerShape,
    output_shape: LayerShape,
    batch_size: usize,
    #[serde(skip)]
    input: Matrix,
}

impl Conv2DLayer {
    pub fn new(
        filter_width: usize,
        filter_height: usize,
        filter_count: usize,
        stride: usize,
        padding: usize,
        activation: ActivationFunction,
    ) -> Conv2DLayer {
        Conv2DLayer {
            filter_width,
            filter_height,
            filter_count,
            stride,
            padding,
            activation,
            weights: Matrix::default(),
            biases: Vec::new(),
            weight_gradients: Matrix::default(),
            bias_gradients: Vec::new(),
            input_shape: LayerShape::default(),
            output_shape: LayerShape::default(),
            batch_size: 0,
            input: Matrix::default(),
        }
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        if self.filter_count == 0 {
            return Err("convolution needs at least one filter".to_string());
        }
        let width = filter_grid_length(input.width, self.filter_width, self.stride, self.padding);
        let height = filter_grid_length(input.height, self.filter_height, self.stride, self.padding);
        match (width, height) {
            (Some(w), Some(h)) if input.depth > 0 => Ok(LayerShape::new(w, h, self.filter_count)),
            _ => Err(format!(
                "{}x{} filter with stride {} and padding {} does not fit input {input}",
                self.filter_width, self.filter_height, self.stride, self.padding
            )),
        }
    }

    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        input: LayerShape,
        batch_size: usize,
        rng: &mut R,
    ) -> ShapeResult {
        let output = self.output_shape(input)?;
        self.input_shape = input;
        self.output_shape = output;

        let receptive_field = self.filter_width * self.filter_height;
        let fan_in = input.depth * receptive_field;
        let fan_out = self.filter_count * receptive_field;
        self.weights = Matrix::glorot(self.filter_count, fan_in, fan_in, fan_out, rng);
        self.biases = vec![0.0; self.filter_count];
        self.weight_gradients = Matrix::zeros(self.filter_count, fan_in);
        self.bias_gradients = vec![0.0; self.filter_count];
        self.set_batch_size(batch_size);
        Ok(output)
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
        self.input = Matrix::zeros(batch_size, self.input_shape.units());
    }

    /// Calls `visit(weight column, input column)` for every tap of the filter
    /// placed at output position (ox, oy) that lands inside the input.
    fn visit_window(&self, ox: usize, oy: usize, mut visit: impl FnMut(usize, usize)) {
        let input = self.input_shape;
        let x0 = (ox * self.stride) as isize - self.padding as isize;
        let y0 = (oy * self.stride) as isize - self.padding as isize;
        for d in 0..input.depth {
            for ky in 0..self.filter_height {
                let y = y0 + ky as isize;
                if y < 0 || y >= input.height as isize {
                    continue;
                }
                for kx in 0..self.filter_width {
                    let x = x0 + kx as isize;
                    if x < 0 || x >= input.width as isize {
                        continue;
                    }
                    let weight_col = (d * self.filter_height + ky) * self.filter_width + kx;
                    visit(weight_col, input.index(x as usize, y as usize, d));
                }
            }
        }
    }

    fn convolve_sample(&self, input: &[f64], output: &mut [f64]) {
        let out_shape = self.output_shape;
        for f in 0..self.filter_count {
            let filter = self.weights.row(f);
            for oy in 0..out_shape.height {
                for ox in 0..out_shape.width {
                    let mut sum = self.biases[f];
                    self.visit_window(ox, oy, |w, i| sum += filter[w] * input[i]);
                    output[out_shape.index(ox, oy, f)] = sum;
                }
            }
        }
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        self.input.copy_from(input);
        self.predict(input)
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        let in_units = self.input_shape.units();
        let out_units = self.output_shape.units();
        assert_eq!(input.cols, in_units, "convolution expects {} inputs", in_units);

        let mut output = Matrix::zeros(input.rows, out_units);
        output
            .data
            .par_chunks_mut(out_units)
            .zip(input.data.par_chunks(in_units))
            .for_each(|(out, inp)| self.convolve_sample(inp, out));
        output
    }

    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        let in_units = self.input_shape.units();
        let out_units = self.output_shape.units();
        let out_shape = self.output_shape;
        let weight_len = self.weights.data.len();
        let filter_len = self.weights.cols;

        let mut input_gradient = Matrix::zeros(output_gradient.rows, in_units);
        let this = &*self;
        let (weight_gradients, bias_gradients) = input_gradient
            .data
            .par_chunks_mut(in_units)
            .zip(output_gradient.data.par_chunks(out_units))
            .zip(this.input.data.par_chunks(in_units))
            .fold(
                || (vec![0.0; weight_len], vec![0.0; this.filter_count]),
                |(mut dw, mut db), ((dx, grad), inp)| {
                    for f in 0..this.filter_count {
                        let filter = this.weights.row(f);
                        let dw_filter = &mut dw[f * filter_len..(f + 1) * filter_len];
                        for oy in 0..out_shape.height {
                            for ox in 0..out_shape.width {
                                let g = grad[out_shape.index(ox, oy, f)];
                                if g == 0.0 {
                                    continue;
                                }
                                db[f] += g;
                                this.visit_window(ox, oy, |w, i| {
                                    dx[i] += filter[w] * g;
                                    dw_filter[w] += inp[i] * g;
                                });
                            }
                        }
                    }
                    (dw, db)
                },
            )
            .reduce(
                || (vec![0.0; weight_len], vec![0.0; this.filter_count]),
                |(mut dw_a, mut db_a), (dw_b, db_b)| {
                    dw_a.iter_mut().zip(dw_b).for_each(|(a, b)| *a += b);
                    db_a.iter_mut().zip(db_b).for_each(|(a, b)| *a += b);
                    (dw_a, db_a)
                },
            );

        self.weight_gradients = Matrix::from_vec(self.filter_count, filter_len, weight_gradients);
        self.bias_gradients = bias_gradients;
        input_gradient
    }

    pub fn parameters(&self) -> WeightsAndBiases<'_> {
        WeightsAndBiases { weights: &self.weights, biases: &self.biases }
    }

    pub fn gradients(&self) -> WeightsAndBiases<'_> {
        WeightsAndBiases { weights: &self.weight_gradients, biases: &self.bias_gradients }
    }

    pub fn add_parameters_and_gradients<'a>(&'a mut self, collector: &mut Vec<ParametersAndGradients<'a>>) {
        collector.push(ParametersAndGradients::weights(&mut self.weights.data, &self.weight_gradients.data));
        collector.push(ParametersAndGradients::biases(&mut self.biases, &self.bias_gradients));
    }

    pub fn copy_for_prediction(&self) -> Conv2DLayer {
        let mut copy = Conv2DLayer::new(
            self.filter_width,
            self.filter_height,
            self.filter_count,
            self.stride,
            self.padding,
            self.activation,
        );
        copy.input_shape = self.input_shape;
        copy.output_shape = self.output_shape;
        copy.weights = self.weights.clone();
        copy.biases = self.biases.clone();
        copy.weight_gradients = Matrix::zeros(self.weights.rows, self.weights.cols);
        copy.bias_gradients = vec![0.0; self.filter_count];
        copy.set_batch_size(1);
        copy
    }
}
