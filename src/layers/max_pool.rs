//! Max pooling.
//!
//! Every output unit remembers which input position produced its maximum
//! (a "switch"). The switches of one batch live in a flat buffer indexed by
//! `batch_item * output_units + unit` and are reallocated whenever the batch
//! size changes.

use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::layers::shape::{filter_grid_length, LayerShape};
use crate::layers::ShapeResult;
use crate::math::matrix::Matrix;

/// Input coordinates that produced an output maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Copy)]
struct PoolGeometry {
    pool_width: usize,
    pool_height: usize,
    stride: usize,
    padding: usize,
    input: LayerShape,
    output: LayerShape,
}

impl PoolGeometry {
    /// Pools one sample, writing the maxima to `output` and their positions
    /// to `switches`. A later value only wins when strictly greater.
    fn pool_sample(&self, input: &[f64], output: &mut [f64], switches: &mut [Switch]) {
        let (inp, out) = (self.input, self.output);
        for d in 0..out.depth {
            for ph in 0..out.height {
                let hstart = (ph * self.stride) as isize - self.padding as isize;
                let hend = (hstart + self.pool_height as isize).min(inp.height as isize);
                let hstart = hstart.max(0) as usize;
                for pw in 0..out.width {
                    let wstart = (pw * self.stride) as isize - self.padding as isize;
                    let wend = (wstart + self.pool_width as isize).min(inp.width as isize);
                    let wstart = wstart.max(0) as usize;

                    let mut current_max = f64::NEG_INFINITY;
                    let mut winner = Switch { x: wstart, y: hstart };
                    for h in hstart..hend as usize {
                        for w in wstart..wend as usize {
                            let v = input[inp.index(w, h, d)];
                            if v > current_max {
                                current_max = v;
                                winner = Switch { x: w, y: h };
                            }
                        }
                    }

                    let n = out.index(pw, ph, d);
                    switches[n] = winner;
                    output[n] = current_max;
                }
            }
        }
    }
}

/// Max pooling layer. Depth is preserved; width and height follow
/// `floor((input + 2 * padding - pool) / stride) + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxPoolLayer {
    pub pool_width: usize,
    pub pool_height: usize,
    pub stride: usize,
    pub padding: usize,
    input_shape: LayerShape,
    output_shape: LayerShape,
    batch_size: usize,
    #[serde(skip)]
    switches: Vec<Switch>,
}

impl MaxPoolLayer {
    /// Pool without padding.
    pub fn new(pool_width: usize, pool_height: usize, stride: usize) -> MaxPoolLayer {
        MaxPoolLayer::with_padding(pool_width, pool_height, stride, 0)
    }

    pub fn with_padding(pool_width: usize, pool_height: usize, stride: usize, padding: usize) -> MaxPoolLayer {
        MaxPoolLayer {
            pool_width,
            pool_height,
            stride,
            padding,
            input_shape: LayerShape::default(),
            output_shape: LayerShape::default(),
            batch_size: 0,
            switches: Vec::new(),
        }
    }

    fn geometry(&self) -> PoolGeometry {
        PoolGeometry {
            pool_width: self.pool_width,
            pool_height: self.pool_height,
            stride: self.stride,
            padding: self.padding,
            input: self.input_shape,
            output: self.output_shape,
        }
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        // With padding below the pool size every window overlaps the input.
        if self.padding >= self.pool_width || self.padding >= self.pool_height {
            return Err(format!(
                "padding {} must be smaller than the {}x{} pool",
                self.padding, self.pool_width, self.pool_height
            ));
        }
        let width = filter_grid_length(input.width, self.pool_width, self.stride, self.padding);
        let height = filter_grid_length(input.height, self.pool_height, self.stride, self.padding);
        match (width, height) {
            (Some(w), Some(h)) if input.depth > 0 => Ok(LayerShape::new(w, h, input.depth)),
            _ => Err(format!(
                "{}x{} pool with stride {} and padding {} does not fit input {input}",
                self.pool_width, self.pool_height, self.stride, self.padding
            )),
        }
    }

    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        input: LayerShape,
        batch_size: usize,
        _rng: &mut R,
    ) -> ShapeResult {
        let output = self.output_shape(input)?;
        self.input_shape = input;
        self.output_shape = output;
        self.set_batch_size(batch_size);
        Ok(output)
    }

    /// Reallocates the switch buffer for `batch_size` samples.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
        self.switches = vec![Switch::default(); batch_size * self.output_shape.units()];
    }

    /// Switches recorded for one sample by the latest `forward`.
    pub fn switches(&self, batch_item: usize) -> &[Switch] {
        let units = self.output_shape.units();
        &self.switches[batch_item * units..(batch_item + 1) * units]
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        assert_eq!(
            input.rows, self.batch_size,
            "max-pool switches are sized for {} samples", self.batch_size
        );
        let geometry = self.geometry();
        let (in_units, out_units) = (geometry.input.units(), geometry.output.units());
        assert_eq!(input.cols, in_units, "max-pool expects {} inputs", in_units);

        let mut output = Matrix::zeros(input.rows, out_units);
        output
            .data
            .par_chunks_mut(out_units)
            .zip(self.switches.par_chunks_mut(out_units))
            .zip(input.data.par_chunks(in_units))
            .for_each(|((out, switches), inp)| geometry.pool_sample(inp, out, switches));
        output
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        let geometry = self.geometry();
        let (in_units, out_units) = (geometry.input.units(), geometry.output.units());
        assert_eq!(input.cols, in_units, "max-pool expects {} inputs", in_units);

        let mut output = Matrix::zeros(input.rows, out_units);
        output
            .data
            .par_chunks_mut(out_units)
            .zip(input.data.par_chunks(in_units))
            .for_each(|(out, inp)| {
                let mut switches = vec![Switch::default(); out_units];
                geometry.pool_sample(inp, out, &mut switches);
            });
        output
    }

    /// Routes each output gradient to the input position that won its window.
    /// Positions that never won keep a zero gradient.
    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        let geometry = self.geometry();
        let (in_units, out_units) = (geometry.input.units(), geometry.output.units());
        assert_eq!(output_gradient.rows, self.batch_size);

        let mut input_gradient = Matrix::zeros(output_gradient.rows, in_units);
        let plane = geometry.output.width * geometry.output.height;
        input_gradient
            .data
            .par_chunks_mut(in_units)
            .zip(output_gradient.data.par_chunks(out_units))
            .zip(self.switches.par_chunks(out_units))
            .for_each(|((dx, grad), switches)| {
                for (n, (g, s)) in grad.iter().zip(switches).enumerate() {
                    let d = n / plane;
                    dx[geometry.input.index(s.x, s.y, d)] += g;
                }
            });
        input_gradient
    }

    pub fn copy_for_prediction(&self) -> MaxPoolLayer {
        let mut copy = MaxPoolLayer::with_padding(self.pool_width, self.pool_height, self.stride, self.padding);
        copy.input_shape = self.input_shape;
        copy.output_shape = self.output_shape;
        copy.set_batch_size(1);
        copy
    }
}
