mod common;

use common::rng;
use ferrite_learn::layers::shape::filter_grid_length;
use ferrite_learn::{
    ActivationFunction, Conv2DLayer, DenseLayer, InputLayer, LayerShape, MaxPoolLayer, NeuralNet,
    NeuralNetError, SoftmaxLayer,
};

#[test]
fn grid_length_follows_the_floor_formula() {
    assert_eq!(filter_grid_length(28, 5, 1, 0), Some(24));
    assert_eq!(filter_grid_length(28, 2, 2, 0), Some(14));
    assert_eq!(filter_grid_length(5, 3, 2, 1), Some(3));
    assert_eq!(filter_grid_length(7, 3, 2, 0), Some(3));
    assert_eq!(filter_grid_length(2, 3, 1, 0), None);
    assert_eq!(filter_grid_length(2, 3, 1, 1), Some(2));
    assert_eq!(filter_grid_length(4, 2, 0, 0), None);
}

#[test]
fn element_index_is_channel_major() {
    let shape = LayerShape::new(4, 3, 2);
    assert_eq!(shape.units(), 24);
    assert_eq!(shape.index(0, 0, 0), 0);
    assert_eq!(shape.index(3, 0, 0), 3);
    assert_eq!(shape.index(0, 1, 0), 4);
    assert_eq!(shape.index(0, 0, 1), 12);
    assert_eq!(shape.index(3, 2, 1), 23);
}

#[test]
fn lenet_like_stack_shapes() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::new(28, 28, 1))
        .add(Conv2DLayer::new(5, 5, 6, 1, 0, ActivationFunction::ReLU))
        .add(MaxPoolLayer::new(2, 2, 2))
        .add(Conv2DLayer::new(5, 5, 16, 1, 0, ActivationFunction::ReLU))
        .add(MaxPoolLayer::new(2, 2, 2))
        .add(DenseLayer::new(32, ActivationFunction::ReLU))
        .add(SoftmaxLayer::new(10));

    let shapes = net.output_shapes().unwrap();
    assert_eq!(shapes[1], LayerShape::new(24, 24, 6));
    assert_eq!(shapes[3], LayerShape::new(12, 12, 6));
    assert_eq!(shapes[4], LayerShape::new(8, 8, 16));
    assert_eq!(shapes[6], LayerShape::new(4, 4, 16));
    assert_eq!(shapes.last(), Some(&LayerShape::flat(10)));

    net.initialize(4, &mut rng(1)).unwrap();
    assert_eq!(net.output_units(), 10);
}

#[test]
fn empty_network_is_rejected() {
    let mut net = NeuralNet::new();
    assert!(matches!(net.initialize(1, &mut rng(0)), Err(NeuralNetError::InvalidConfiguration(_))));
}

#[test]
fn first_layer_must_be_input() {
    let mut net = NeuralNet::new();
    net.add(DenseLayer::new(3, ActivationFunction::Identity));
    match net.output_shapes() {
        Err(NeuralNetError::ShapeMismatch { index, layer, .. }) => {
            assert_eq!(index, 0);
            assert_eq!(layer, "Dense");
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}

#[test]
fn input_layer_only_first() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::flat(3)).add(InputLayer::flat(3));
    assert!(matches!(
        net.output_shapes(),
        Err(NeuralNetError::ShapeMismatch { index: 1, layer: "Input", .. })
    ));
}

#[test]
fn pool_larger_than_input_is_a_shape_mismatch() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::new(3, 3, 1)).add(MaxPoolLayer::new(4, 4, 1));
    assert!(matches!(
        net.initialize(2, &mut rng(0)),
        Err(NeuralNetError::ShapeMismatch { index: 1, layer: "MaxPool", .. })
    ));
}

#[test]
fn filter_larger_than_padded_input_is_a_shape_mismatch() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::new(4, 4, 1))
        .add(Conv2DLayer::new(7, 7, 2, 1, 1, ActivationFunction::Identity));
    assert!(matches!(net.output_shapes(), Err(NeuralNetError::ShapeMismatch { index: 1, .. })));
}

#[test]
fn zero_batch_size_is_rejected() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::flat(2)).add(SoftmaxLayer::new(2));
    assert!(matches!(net.initialize(0, &mut rng(0)), Err(NeuralNetError::InvalidConfiguration(_))));
}
