#![allow(dead_code)]

use ferrite_learn::layers::ParametersAndGradients;
use ferrite_learn::{Layer, LayerShape, Matrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const STEP: f64 = 1e-5;

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn random_matrix(rows: usize, cols: usize, rng: &mut StdRng) -> Matrix {
    let data = (0..rows * cols).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Matrix::from_vec(rows, cols, data)
}

/// Builds and initializes a single layer for `batch_size` samples.
pub fn initialized(layer: impl Into<Layer>, input: LayerShape, batch_size: usize, seed: u64) -> (Layer, LayerShape) {
    let mut layer = layer.into();
    let output = layer.initialize(input, batch_size, &mut rng(seed)).expect("layer accepts its input");
    (layer, output)
}

/// Scalar objective `Σ output ⊙ upstream`; its gradient with respect to the
/// output is `upstream`.
pub fn objective(layer: &mut Layer, input: &Matrix, upstream: &Matrix) -> f64 {
    let output = layer.forward(input);
    output.data.iter().zip(&upstream.data).map(|(o, u)| o * u).sum()
}

pub fn assert_close(analytic: f64, numeric: f64, tolerance: f64, what: &str) {
    let scale = 1.0 + analytic.abs().max(numeric.abs());
    assert!(
        (analytic - numeric).abs() <= tolerance * scale,
        "{what}: analytic {analytic} vs numeric {numeric}"
    );
}

fn nudge(layer: &mut Layer, tensor: usize, index: usize, delta: f64) {
    let mut pairs: Vec<ParametersAndGradients<'_>> = Vec::new();
    layer.add_parameters_and_gradients(&mut pairs);
    pairs[tensor].parameters[index] += delta;
}

fn analytic_gradients(layer: &mut Layer) -> Vec<Vec<f64>> {
    let mut pairs: Vec<ParametersAndGradients<'_>> = Vec::new();
    layer.add_parameters_and_gradients(&mut pairs);
    pairs.iter().map(|pg| pg.gradients.to_vec()).collect()
}

/// Compares every parameter gradient from `backward` with a central
/// difference of `objective`.
pub fn check_parameter_gradients(layer: &mut Layer, input: &Matrix, upstream: &Matrix, tolerance: f64) {
    layer.forward(input);
    layer.backward(upstream);
    let analytic = analytic_gradients(layer);
    assert!(!analytic.is_empty(), "{} has no parameters", layer.name());

    for (tensor, gradients) in analytic.iter().enumerate() {
        for (index, &expected) in gradients.iter().enumerate() {
            nudge(layer, tensor, index, STEP);
            let plus = objective(layer, input, upstream);
            nudge(layer, tensor, index, -2.0 * STEP);
            let minus = objective(layer, input, upstream);
            nudge(layer, tensor, index, STEP);

            let numeric = (plus - minus) / (2.0 * STEP);
            assert_close(expected, numeric, tolerance, &format!("{} tensor {tensor}[{index}]", layer.name()));
        }
    }
}

/// Compares the input gradient from `backward` with a central difference.
pub fn check_input_gradient(layer: &mut Layer, input: &Matrix, upstream: &Matrix, tolerance: f64) {
    layer.forward(input);
    let analytic = layer.backward(upstream);
    assert_eq!(analytic.shape(), input.shape());

    for index in 0..input.data.len() {
        let mut plus = input.clone();
        plus.data[index] += STEP;
        let mut minus = input.clone();
        minus.data[index] -= STEP;

        let numeric = (objective(layer, &plus, upstream) - objective(layer, &minus, upstream)) / (2.0 * STEP);
        assert_close(analytic.data[index], numeric, tolerance, &format!("{} input[{index}]", layer.name()));
    }
}
