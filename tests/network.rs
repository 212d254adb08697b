mod common;

use common::{random_matrix, rng};
use ferrite_learn::network::{LayerKind, LayerSpec};
use ferrite_learn::{
    ActivationFunction, BatchNormLayer, Conv2DLayer, DenseLayer, InputLayer, LossType, NeuralNet,
    NetworkSpec, NeuralNetLearnerConfig, RegressionNeuralNetLearner, SquaredErrorRegressionLayer,
};

fn temp_path(name: &str) -> String {
    let path = std::env::temp_dir().join(format!("ferrite-learn-{name}-{}.json", std::process::id()));
    path.to_string_lossy().into_owned()
}

#[test]
fn add_appends_activation_layers() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::new(4, 4, 1))
        .add(Conv2DLayer::new(3, 3, 2, 1, 0, ActivationFunction::ReLU))
        .add(DenseLayer::new(3, ActivationFunction::Identity))
        .add(SquaredErrorRegressionLayer::new(1));
    let names: Vec<&str> = net.layers.iter().map(|l| l.name()).collect();
    assert_eq!(names, vec!["Input", "Conv2D", "Activation", "Dense", "SquaredErrorRegression"]);
}

#[test]
fn trainable_tensors_come_in_layer_order() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::new(3, 3, 2))
        .add(Conv2DLayer::new(2, 2, 4, 1, 0, ActivationFunction::ReLU))
        .add(BatchNormLayer::new())
        .add(SquaredErrorRegressionLayer::new(1));
    net.initialize(2, &mut rng(3)).unwrap();

    let sizes: Vec<(usize, bool)> =
        net.parameters_and_gradients().iter().map(|pg| (pg.parameters.len(), pg.decay)).collect();
    assert_eq!(
        sizes,
        vec![
            (4 * 2 * 2 * 2, true),
            (4, false),
            (4, false),
            (4, false),
            (2 * 2 * 4, true),
            (1, false),
        ]
    );
}

#[test]
fn backward_returns_the_input_gradient_shape() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::new(5, 5, 1))
        .add(Conv2DLayer::new(3, 3, 2, 2, 1, ActivationFunction::Tanh))
        .add(DenseLayer::new(4, ActivationFunction::Sigmoid))
        .add(SquaredErrorRegressionLayer::new(2));
    net.initialize(3, &mut rng(4)).unwrap();

    let mut r = rng(5);
    let input = random_matrix(3, 25, &mut r);
    let output = net.forward(&input);
    assert_eq!(output.shape(), (3, 2));

    let gradient = net.backward(&random_matrix(3, 2, &mut r));
    assert_eq!(gradient.shape(), (3, 25));
    assert_eq!(net.predict(&input), output);
}

#[test]
fn network_json_round_trip_keeps_predictions() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::flat(3))
        .add(DenseLayer::new(5, ActivationFunction::Elu { alpha: 1.0 }))
        .add(SquaredErrorRegressionLayer::new(1));
    net.initialize(2, &mut rng(6)).unwrap();

    let path = temp_path("net");
    net.save_json(&path).unwrap();
    let loaded = NeuralNet::load_json(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let input = random_matrix(4, 3, &mut rng(7));
    assert_eq!(loaded.predict(&input), net.predict(&input));
    assert_eq!(loaded.output_units(), 1);
}

#[test]
fn spec_file_drives_a_regression_run() {
    let spec = NetworkSpec {
        name: "line".to_string(),
        layers: vec![
            LayerSpec::new(LayerKind::Input { width: 1, height: 1, depth: 2 }),
            LayerSpec { kind: LayerKind::Dense { units: 3, activation: ActivationFunction::Identity }, input_size: Some(2) },
            LayerSpec::new(LayerKind::Regression { targets: 1 }),
        ],
        loss: LossType::Huber,
        learner: NeuralNetLearnerConfig { iterations: 2, batch_size: 2, ..Default::default() },
    };

    let path = temp_path("spec");
    spec.save_json(&path).unwrap();
    let loaded = NetworkSpec::load_json(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, spec);

    let learner = RegressionNeuralNetLearner::new(loaded.build().unwrap(), loaded.loss, loaded.learner.clone()).unwrap();
    let observations = random_matrix(3, 2, &mut rng(8));
    let model = learner.learn(&observations, &[0.1, 0.2, 0.3]).unwrap();
    assert_eq!(model.model().predict_batch(&observations).shape(), (3, 1));
}

#[test]
fn weights_survive_json_bit_for_bit() {
    let weights = random_matrix(64, 64, &mut rng(21));
    let json = serde_json::to_string(&weights).unwrap();
    let back: ferrite_learn::Matrix = serde_json::from_str(&json).unwrap();
    for (a, b) in weights.data.iter().zip(&back.data) {
        assert_eq!(a.to_bits(), b.to_bits(), "{a} reloaded as {b}");
    }
}
