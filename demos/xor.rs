use ferrite_learn::{
    ActivationFunction, ClassificationNeuralNetLearner, DenseLayer, InputLayer, LossType, Matrix,
    NeuralNet, NeuralNetLearnerConfig, OptimizerMethod, PredictorModel, ProbabilityPrediction,
    SoftmaxLayer,
};

fn main() -> ferrite_learn::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut net = NeuralNet::new();
    net.add(InputLayer::flat(2))
        .add(DenseLayer::new(8, ActivationFunction::Tanh))
        .add(SoftmaxLayer::new(2));

    let observations = Matrix::from_rows(vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ]);
    let targets = vec![1.0, 0.0, 1.0, 0.0];

    let config = NeuralNetLearnerConfig {
        iterations: 500,
        learning_rate: 0.05,
        batch_size: 4,
        optimizer_method: OptimizerMethod::Adam,
        ..Default::default()
    };
    let learner = ClassificationNeuralNetLearner::new(net, LossType::CrossEntropy, config)?;
    let model = learner.learn(&observations, &targets)?;

    for row in 0..observations.rows {
        let input = observations.row(row);
        let prediction: ProbabilityPrediction = model.predict(input);
        println!("Input: {input:?} -> class {} {:?}", prediction.prediction, prediction.probabilities);
    }
    Ok(())
}
