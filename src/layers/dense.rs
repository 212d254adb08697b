use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::layers::shape::LayerShape;
use crate::layers::{ParametersAndGradients, ShapeResult, WeightsAndBiases};
use crate::math::matrix::Matrix;

/// Fully connected layer: `out = x · W + b`.
///
/// `weights` has shape (input units, units). The activation is not applied
/// here; `NeuralNet::add` appends an `ActivationLayer` for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub units: usize,
    pub activation: ActivationFunction,
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub weight_gradients: Matrix,
    pub bias_gradients: Vec<f64>,
    input_units: usize,
    batch_size: usize,
    // input of the latest forward pass, needed for the weight gradient
    #[serde(skip)]
    input: Matrix,
}

impl DenseLayer {
    pub fn new(units: usize, activation: ActivationFunction) -> DenseLayer {
        DenseLayer {
            units,
            activation,
            weights: Matrix::default(),
            biases: Vec::new(),
            weight_gradients: Matrix::default(),
            bias_gradients: Vec::new(),
            input_units: 0,
            batch_size: 0,
            input: Matrix::default(),
        }
    }

    pub fn output_shape(&self, input: LayerShape) -> ShapeResult {
        if self.units == 0 {
            return Err("dense layer needs at least one unit".to_string());
        }
        if input.units() == 0 {
            return Err(format!("dense layer cannot take an empty input ({input})"));
        }
        Ok(LayerShape::flat(self.units))
    }

    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        input: LayerShape,
        batch_size: usize,
        rng: &mut R,
    ) -> ShapeResult {
        let output = self.output_shape(input)?;
        self.input_units = input.units();
        self.weights = Matrix::glorot(self.input_units, self.units, self.input_units, self.units, rng);
        self.biases = vec![0.0; self.units];
        self.weight_gradients = Matrix::zeros(self.input_units, self.units);
        self.bias_gradients = vec![0.0; self.units];
        self.set_batch_size(batch_size);
        Ok(output)
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
        self.input = Matrix::zeros(batch_size, self.input_units);
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        self.input.copy_from(input);
        self.predict(input)
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        assert_eq!(input.cols, self.input_units, "dense layer expects {} inputs", self.input_units);
        let mut output = input.dot(&self.weights);
        let biases = &self.biases;
        output.data.par_chunks_mut(self.units).for_each(|row| {
            for (o, b) in row.iter_mut().zip(biases) {
                *o += b;
            }
        });
        output
    }

    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        self.weight_gradients = self.input.t_dot(output_gradient);
        self.bias_gradients = output_gradient.column_sums();
        output_gradient.dot_t(&self.weights)
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

    pub fn copy_for_prediction(&self) -> DenseLayer {
        let mut copy = DenseLayer::new(self.units, self.activation);
        copy.input_units = self.input_units;
        copy.weights = self.weights.clone();
        copy.biases = self.biases.clone();
        copy.weight_gradients = Matrix::zeros(self.input_units, self.units);
        copy.bias_gradients = vec![0.0; self.units];
        copy.set_batch_size(1);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn forward_adds_bias_to_product() {
        let mut layer = DenseLayer::new(2, ActivationFunction::Identity);
        let mut rng = StdRng::seed_from_u64(1);
        layer.initialize(LayerShape::flat(3), 1, &mut rng).unwrap();
        layer.weights = Matrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]);
        layer.biases = vec![0.5, -0.5];

        let out = layer.forward(&Matrix::from_rows(vec![vec![1.0, 2.0, 3.0]]));
        assert_eq!(out.data, vec![4.5, 4.5]);
    }

    #[test]
    fn backward_fills_gradients() {
        let mut layer = DenseLayer::new(1, ActivationFunction::Identity);
        let mut rng = StdRng::seed_from_u64(1);
        layer.initialize(LayerShape::flat(2), 2, &mut rng).unwrap();
        layer.weights = Matrix::from_rows(vec![vec![2.0], vec![-1.0]]);

        layer.forward(&Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
        let dx = layer.backward(&Matrix::from_rows(vec![vec![1.0], vec![0.5]]));

        assert_eq!(layer.weight_gradients.data, vec![2.5, 4.0]);
        assert_eq!(layer.bias_gradients, vec![1.5]);
        assert_eq!(dx.data, vec![2.0, -1.0, 1.0, -0.5]);
    }

    #[test]
    fn forward_reuses_the_batch_sized_input_cache() {
        let mut layer = DenseLayer::new(1, ActivationFunction::Identity);
        let mut rng = StdRng::seed_from_u64(1);
        layer.initialize(LayerShape::flat(2), 4, &mut rng).unwrap();
        layer.set_batch_size(2);
        let buffer = layer.input.data.as_ptr();

        let batch = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        layer.forward(&batch);

        assert_eq!(layer.input, batch);
        assert_eq!(layer.input.data.as_ptr(), buffer);
    }
}
