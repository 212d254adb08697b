use std::sync::mpsc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ferrite_learn::{
    ActivationFunction, BatchNormLayer, ClassificationNeuralNetLearner, Conv2DLayer, DenseLayer,
    DropoutLayer, InputLayer, LossType, Matrix, MaxPoolLayer, NeuralNet, NeuralNetLearnerConfig,
    OptimizerMethod, PredictorModel, SoftmaxLayer,
};

const SIDE: usize = 8;

/// 8x8 grayscale image with a bright horizontal (class 0) or vertical
/// (class 1) bar at a random position, plus noise.
fn bar_image(rng: &mut StdRng, vertical: bool) -> Vec<f64> {
    let mut pixels: Vec<f64> = (0..SIDE * SIDE).map(|_| rng.gen_range(0.0..0.2)).collect();
    let line = rng.gen_range(0..SIDE);
    for i in 0..SIDE {
        let (x, y) = if vertical { (line, i) } else { (i, line) };
        pixels[y * SIDE + x] = 1.0;
    }
    pixels
}

fn main() -> ferrite_learn::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = StdRng::seed_from_u64(3);
    let mut rows = Vec::new();
    let mut targets = Vec::new();
    for i in 0..200 {
        let vertical = i % 2 == 1;
        rows.push(bar_image(&mut rng, vertical));
        targets.push(if vertical { 1.0 } else { 0.0 });
    }
    let observations = Matrix::from_rows(rows);

    let mut net = NeuralNet::new();
    net.add(InputLayer::new(SIDE, SIDE, 1))
        .add(Conv2DLayer::new(3, 3, 4, 1, 1, ActivationFunction::ReLU))
        .add(BatchNormLayer::new())
        .add(MaxPoolLayer::new(2, 2, 2))
        .add(DropoutLayer::new(0.2))
        .add(DenseLayer::new(16, ActivationFunction::ReLU))
        .add(SoftmaxLayer::new(2));

    let config = NeuralNetLearnerConfig {
        iterations: 15,
        learning_rate: 0.005,
        batch_size: 32,
        optimizer_method: OptimizerMethod::Adam,
        ..Default::default()
    };

    let (tx, rx) = mpsc::channel();
    let learner = ClassificationNeuralNetLearner::new(net, LossType::CrossEntropy, config)?.with_progress(tx);
    let model = learner.learn(&observations, &targets)?;

    if let Some(last) = rx.try_iter().last() {
        println!(
            "final epoch {}: loss {:.4}, accuracy {:.3}",
            last.epoch,
            last.train_loss,
            last.train_accuracy.unwrap_or(0.0)
        );
    }

    let predictions: Vec<f64> = model.predict_batch(&observations);
    let correct = predictions.iter().zip(&targets).filter(|(p, t)| p == t).count();
    println!("training accuracy: {correct}/{}", targets.len());
    Ok(())
}
