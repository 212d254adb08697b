mod common;

use std::sync::mpsc;

use approx::assert_relative_eq;
use common::rng;
use ferrite_learn::encoders::{TargetEncoder, TargetEncoding};
use ferrite_learn::{
    ActivationFunction, ClassificationNeuralNetLearner, ClassificationNeuralNetModel, Conv2DLayer,
    DenseLayer, InputLayer, LossType, Matrix, MaxPoolLayer, NeuralNet, NeuralNetError,
    NeuralNetLearnerConfig, OptimizerMethod, PredictorModel, ProbabilityPrediction,
    RegressionNeuralNetLearner, SoftmaxLayer, SquaredErrorRegressionLayer,
};

fn classifier(classes: usize) -> NeuralNet {
    let mut net = NeuralNet::new();
    net.add(InputLayer::flat(2))
        .add(DenseLayer::new(6, ActivationFunction::Tanh))
        .add(SoftmaxLayer::new(classes));
    net
}

fn linear_regressor() -> NeuralNet {
    let mut net = NeuralNet::new();
    net.add(InputLayer::flat(2)).add(SquaredErrorRegressionLayer::new(1));
    net
}

fn blobs() -> (Matrix, Vec<f64>) {
    let observations = Matrix::from_rows(vec![
        vec![0.0, 0.1],
        vec![0.2, 0.0],
        vec![1.0, 1.1],
        vec![0.9, 1.0],
        vec![2.0, 0.0],
        vec![2.1, 0.2],
        vec![0.1, 0.0],
    ]);
    (observations, vec![5.0, 5.0, -1.0, -1.0, 2.0, 2.0, 5.0])
}

#[test]
fn zero_iterations_returns_the_initialized_network() {
    let config = NeuralNetLearnerConfig { iterations: 0, batch_size: 4, seed: 9, ..Default::default() };
    let (observations, targets) = blobs();
    let learner = ClassificationNeuralNetLearner::new(classifier(3), LossType::CrossEntropy, config).unwrap();
    let model = learner.learn(&observations, &targets).unwrap();

    let mut expected = classifier(3);
    expected.initialize(4, &mut rng(9)).unwrap();
    let expected = expected.copy_for_prediction();

    assert_eq!(model.model().predict_batch(&observations), expected.predict(&observations));
}

#[test]
fn classes_are_decoded_in_ascending_order() {
    let config = NeuralNetLearnerConfig {
        iterations: 300,
        learning_rate: 0.05,
        batch_size: 7,
        optimizer_method: OptimizerMethod::Adam,
        ..Default::default()
    };
    let (observations, targets) = blobs();
    let learner = ClassificationNeuralNetLearner::new(classifier(3), LossType::CrossEntropy, config).unwrap();
    let model = learner.learn(&observations, &targets).unwrap();

    assert_eq!(model.classes(), &[-1.0, 2.0, 5.0]);

    let probability: ProbabilityPrediction = model.predict(observations.row(0));
    let classes: Vec<f64> = probability.probabilities.iter().map(|(c, _)| *c).collect();
    assert_eq!(classes, vec![-1.0, 2.0, 5.0]);
    assert_relative_eq!(probability.probabilities.iter().map(|(_, p)| p).sum::<f64>(), 1.0, epsilon = 1e-9);

    let predictions: Vec<f64> = model.predict_batch(&observations);
    assert_eq!(predictions, targets);
}

#[test]
fn one_of_n_encoding_is_a_bijection() {
    let targets = [3.0, -2.0, 7.5, 3.0, 0.0];
    let encoder = TargetEncoder::fit(TargetEncoding::OneOfN, &targets).unwrap();
    let encoded = encoder.encode(&targets).unwrap();

    for (row, &target) in targets.iter().enumerate() {
        assert_eq!(encoded.row(row).iter().sum::<f64>(), 1.0);
        let hot = encoded.row_argmax()[row];
        assert_eq!(encoder.decode(hot), Some(target));
    }
}

#[test]
fn linear_regression_loss_decreases_every_epoch() {
    let observations = Matrix::from_rows(vec![
        vec![0.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 1.0],
    ]);
    let targets: Vec<f64> = (0..4).map(|r| 2.0 * observations.get(r, 0) - observations.get(r, 1) + 0.5).collect();
    let config = NeuralNetLearnerConfig {
        iterations: 40,
        learning_rate: 0.05,
        batch_size: 4,
        optimizer_method: OptimizerMethod::Adagrad,
        ..Default::default()
    };

    let (tx, rx) = mpsc::channel();
    let learner = RegressionNeuralNetLearner::new(linear_regressor(), LossType::Mse, config)
        .unwrap()
        .with_progress(tx);
    learner.learn(&observations, &targets).unwrap();

    let losses: Vec<f64> = rx.try_iter().map(|stats| stats.train_loss).collect();
    assert_eq!(losses.len(), 40);
    for pair in losses.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "loss went up: {} -> {}", pair[0], pair[1]);
    }
    assert!(losses[39] < losses[0]);
}

#[test]
fn epoch_stats_carry_accuracy_for_classification() {
    let config = NeuralNetLearnerConfig { iterations: 3, batch_size: 3, ..Default::default() };
    let (observations, targets) = blobs();
    let (tx, rx) = mpsc::channel();
    let learner = ClassificationNeuralNetLearner::new(classifier(3), LossType::CrossEntropy, config)
        .unwrap()
        .with_progress(tx);
    learner.learn(&observations, &targets).unwrap();

    let stats: Vec<_> = rx.try_iter().collect();
    assert_eq!(stats.iter().map(|s| s.epoch).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(stats.iter().all(|s| s.total_epochs == 3));
    assert!(stats.iter().all(|s| matches!(s.train_accuracy, Some(a) if (0.0..=1.0).contains(&a))));
}

#[test]
fn learner_requires_a_matching_head() {
    let config = NeuralNetLearnerConfig::default();
    match ClassificationNeuralNetLearner::new(linear_regressor(), LossType::CrossEntropy, config.clone()) {
        Err(NeuralNetError::MissingCapability { expected, actual }) => {
            assert_eq!(expected, "classification");
            assert_eq!(actual, "SquaredErrorRegression");
        }
        other => panic!("expected MissingCapability, got {other:?}"),
    }
    assert!(matches!(
        RegressionNeuralNetLearner::new(classifier(2), LossType::Mse, config.clone()),
        Err(NeuralNetError::MissingCapability { expected: "regression", actual: "Softmax" })
    ));

    let mut headless = NeuralNet::new();
    headless.add(InputLayer::flat(2)).add(DenseLayer::new(1, ActivationFunction::Identity));
    assert!(matches!(
        RegressionNeuralNetLearner::new(headless, LossType::Mse, config),
        Err(NeuralNetError::MissingCapability { actual: "Dense", .. })
    ));
}

#[test]
fn class_count_must_match_the_softmax_width() {
    let (observations, targets) = blobs();
    let learner =
        ClassificationNeuralNetLearner::new(classifier(2), LossType::CrossEntropy, NeuralNetLearnerConfig::default())
            .unwrap();
    assert!(matches!(learner.learn(&observations, &targets), Err(NeuralNetError::InvalidData(_))));
}

#[test]
fn observation_width_must_match_the_input_layer() {
    let learner =
        RegressionNeuralNetLearner::new(linear_regressor(), LossType::Mse, NeuralNetLearnerConfig::default()).unwrap();
    let observations = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0]]);
    assert!(matches!(learner.learn(&observations, &[1.0]), Err(NeuralNetError::InvalidData(_))));
}

#[test]
fn indices_select_the_training_rows() {
    let (observations, targets) = blobs();
    let config = NeuralNetLearnerConfig { iterations: 2, batch_size: 2, ..Default::default() };
    let learner = ClassificationNeuralNetLearner::new(classifier(3), LossType::CrossEntropy, config).unwrap();

    // rows 0..4 only hold classes 5 and -1; the class list still covers every target
    let model = learner.learn_indices(&observations, &targets, &[0, 1, 2, 3]).unwrap();
    assert_eq!(model.classes(), &[-1.0, 2.0, 5.0]);
    let prediction: ProbabilityPrediction = model.predict(observations.row(4));
    assert_eq!(prediction.probabilities.iter().map(|&(class, _)| class).collect::<Vec<_>>(), vec![-1.0, 2.0, 5.0]);

    assert!(matches!(
        learner.learn_indices(&observations, &targets, &[0, 99]),
        Err(NeuralNetError::InvalidData(_))
    ));
}

#[test]
fn short_last_batch_with_pooling() {
    let mut net = NeuralNet::new();
    net.add(InputLayer::new(4, 4, 1))
        .add(Conv2DLayer::new(3, 3, 2, 1, 1, ActivationFunction::ReLU))
        .add(MaxPoolLayer::new(2, 2, 2))
        .add(SoftmaxLayer::new(2));

    let rows: Vec<Vec<f64>> = (0..5)
        .map(|i| (0..16).map(|p| if (p + i) % 2 == 0 { 1.0 } else { 0.0 }).collect())
        .collect();
    let targets = vec![0.0, 1.0, 0.0, 1.0, 0.0];
    let config = NeuralNetLearnerConfig { iterations: 3, batch_size: 2, ..Default::default() };
    let learner = ClassificationNeuralNetLearner::new(net, LossType::CrossEntropy, config).unwrap();

    let model = learner.learn(&Matrix::from_rows(rows.clone()), &targets).unwrap();
    let prediction: ProbabilityPrediction = model.predict(rows[4].as_slice());
    assert_eq!(prediction.probabilities.len(), 2);
}

#[test]
fn trained_model_survives_json() {
    let (observations, targets) = blobs();
    let config = NeuralNetLearnerConfig { iterations: 20, batch_size: 4, ..Default::default() };
    let learner = ClassificationNeuralNetLearner::new(classifier(3), LossType::CrossEntropy, config).unwrap();
    let model = learner.learn(&observations, &targets).unwrap();

    let path = std::env::temp_dir().join(format!("ferrite-learn-model-{}.json", std::process::id()));
    let path = path.to_str().unwrap();
    model.save_json(path).unwrap();
    let loaded = ClassificationNeuralNetModel::load_json(path).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(loaded.classes(), model.classes());
    let before: Vec<ProbabilityPrediction> = model.predict_batch(&observations);
    let after: Vec<ProbabilityPrediction> = loaded.predict_batch(&observations);
    assert_eq!(before, after);
}

#[test]
fn same_seed_same_model() {
    let (observations, targets) = blobs();
    let config = NeuralNetLearnerConfig { iterations: 5, batch_size: 3, ..Default::default() };
    let learner = ClassificationNeuralNetLearner::new(classifier(3), LossType::CrossEntropy, config).unwrap();

    let first = learner.learn(&observations, &targets).unwrap();
    let second = learner.learn(&observations, &targets).unwrap();
    assert_eq!(first.model().predict_batch(&observations), second.model().predict_batch(&observations));
}
