use approx::assert_relative_eq;
use ferrite_learn::layers::ParametersAndGradients;
use ferrite_learn::{NeuralNetOptimizer, OptimizerMethod};

fn run(optimizer: &mut NeuralNetOptimizer, parameters: &mut [f64], gradients: &[f64]) {
    let mut pairs = vec![ParametersAndGradients::weights(parameters, gradients)];
    optimizer.update(&mut pairs);
}

#[test]
fn adam_moments_converge_to_gradient_statistics() {
    let mut optimizer = NeuralNetOptimizer::new(OptimizerMethod::Adam, 0.001);
    let mut parameters = vec![0.0, 0.0];
    let gradients = [0.5, -2.0];
    for _ in 0..10_000 {
        run(&mut optimizer, &mut parameters, &gradients);
    }

    let state = &optimizer.states()[0];
    assert_eq!(state.step, 10_000);
    assert_relative_eq!(state.first[0], 0.5, max_relative = 1e-6);
    assert_relative_eq!(state.first[1], -2.0, max_relative = 1e-6);
    assert_relative_eq!(state.second[0], 0.25, max_relative = 1e-3);
    assert_relative_eq!(state.second[1], 4.0, max_relative = 1e-3);
}

#[test]
fn adam_first_step_has_learning_rate_magnitude() {
    let mut optimizer = NeuralNetOptimizer::new(OptimizerMethod::Adam, 0.01);
    let mut parameters = vec![1.0, 1.0];
    run(&mut optimizer, &mut parameters, &[3.0, -0.001]);
    assert_relative_eq!(parameters[0], 0.99, epsilon = 1e-6);
    assert_relative_eq!(parameters[1], 1.01, epsilon = 1e-4);
}

#[test]
fn state_is_positional_per_tensor() {
    let mut optimizer = NeuralNetOptimizer::new(OptimizerMethod::Adagrad, 0.1);
    let mut weights = vec![0.0; 3];
    let mut biases = vec![0.0];
    {
        let mut pairs = vec![
            ParametersAndGradients::weights(&mut weights, &[1.0, 2.0, 3.0]),
            ParametersAndGradients::biases(&mut biases, &[4.0]),
        ];
        optimizer.update(&mut pairs);
    }
    let states = optimizer.states();
    assert_eq!(states.len(), 2);
    assert_eq!(states[0].first, vec![1.0, 4.0, 9.0]);
    assert_eq!(states[1].first, vec![16.0]);
}

#[test]
fn adadelta_ignores_the_learning_rate() {
    let mut slow = NeuralNetOptimizer::new(OptimizerMethod::Adadelta, 1e-6);
    let mut fast = NeuralNetOptimizer::new(OptimizerMethod::Adadelta, 10.0);
    let (mut a, mut b) = (vec![1.0], vec![1.0]);
    for _ in 0..10 {
        run(&mut slow, &mut a, &[0.3]);
        run(&mut fast, &mut b, &[0.3]);
    }
    assert_eq!(a, b);
    assert!(a[0] < 1.0);
}
