use crate::layers::ParametersAndGradients;
use crate::optim::optimizer_method::OptimizerMethod;
use crate::train::train_config::NeuralNetLearnerConfig;

/// Accumulators for one trainable tensor, indexed like the tensor itself.
///
/// What the two buffers hold depends on the method:
///
/// | method   | `first`                  | `second`                     |
/// |----------|--------------------------|------------------------------|
/// | Momentum | velocity                 | -                            |
/// | Nesterov | velocity                 | -                            |
/// | Adagrad  | sum of squared gradients | -                            |
/// | RmsProp  | decayed squared gradient | -                            |
/// | Adadelta | decayed squared gradient | decayed squared update       |
/// | Adam     | first moment             | second moment                |
/// | AdaMax   | first moment             | infinity norm                |
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerState {
    pub first: Vec<f64>,
    pub second: Vec<f64>,
    /// Number of updates applied so far (bias correction).
    pub step: usize,
}

impl OptimizerState {
    pub fn new(len: usize) -> OptimizerState {
        OptimizerState { first: vec![0.0; len], second: vec![0.0; len], step: 0 }
    }
}

/// Applies one update rule, with L1/L2 decay, to every trainable tensor.
///
/// State is kept positionally: the i-th tensor of the list passed to
/// `update` always uses the i-th `OptimizerState`. A network hands its
/// tensors over in a fixed layer order, so the pairing is stable for the
/// whole training run.
#[derive(Debug, Clone)]
pub struct NeuralNetOptimizer {
    pub method: OptimizerMethod,
    pub learning_rate: f64,
    pub momentum: f64,
    pub ro: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub l1decay: f64,
    pub l2decay: f64,
    pub epsilon: f64,
    states: Vec<OptimizerState>,
}

impl NeuralNetOptimizer {
    pub fn new(method: OptimizerMethod, learning_rate: f64) -> NeuralNetOptimizer {
        NeuralNetOptimizer {
            method,
            learning_rate,
            momentum: 0.9,
            ro: 0.95,
            beta1: 0.9,
            beta2: 0.999,
            l1decay: 0.0,
            l2decay: 0.0,
            epsilon: 1e-8,
            states: Vec::new(),
        }
    }

    pub fn from_config(config: &NeuralNetLearnerConfig) -> NeuralNetOptimizer {
        NeuralNetOptimizer {
            method: config.optimizer_method,
            learning_rate: config.learning_rate,
            momentum: config.momentum,
            ro: config.ro,
            beta1: config.beta1,
            beta2: config.beta2,
            l1decay: config.l1decay,
            l2decay: config.l2decay,
            epsilon: 1e-8,
            states: Vec::new(),
        }
    }

    pub fn states(&self) -> &[OptimizerState] {
        &self.states
    }

    /// Drops all accumulated state.
    pub fn reset(&mut self) {
        self.states.clear();
    }

    /// Updates every tensor in place from its gradient.
    ///
    /// # Panics
    /// Panics if the tensor list changes length or a tensor changes size
    /// between calls.
    pub fn update(&mut self, parameters_and_gradients: &mut [ParametersAndGradients<'_>]) {
        if self.states.is_empty() {
            self.states = parameters_and_gradients
                .iter()
                .map(|pg| OptimizerState::new(pg.parameters.len()))
                .collect();
        }
        assert_eq!(
            self.states.len(),
            parameters_and_gradients.len(),
            "optimizer state was built for a different tensor list"
        );

        let mut states = std::mem::take(&mut self.states);
        for (pg, state) in parameters_and_gradients.iter_mut().zip(states.iter_mut()) {
            self.update_tensor(pg, state);
        }
        self.states = states;
    }

    fn update_tensor(&self, pg: &mut ParametersAndGradients<'_>, state: &mut OptimizerState) {
        assert_eq!(pg.parameters.len(), pg.gradients.len(), "Parameters and gradients must have the same length");
        assert_eq!(state.first.len(), pg.parameters.len(), "optimizer state size does not match its tensor");

        let (l1, l2) = if pg.decay { (self.l1decay, self.l2decay) } else { (0.0, 0.0) };
        let (lr, eps) = (self.learning_rate, self.epsilon);
        state.step += 1;
        let t = state.step as i32;
        let bias_correction1 = 1.0 - self.beta1.powi(t);
        let bias_correction2 = 1.0 - self.beta2.powi(t);

        for j in 0..pg.parameters.len() {
            let w = pg.parameters[j];
            let sign = if w > 0.0 { 1.0 } else if w < 0.0 { -1.0 } else { 0.0 };
            let g = pg.gradients[j] + l2 * w + l1 * sign;
            let first = &mut state.first[j];
            let second = &mut state.second[j];

            let delta = match self.method {
                OptimizerMethod::Sgd => -lr * g,
                OptimizerMethod::Momentum => {
                    *first = self.momentum * *first - lr * g;
                    *first
                }
                OptimizerMethod::Nesterov => {
                    let previous = *first;
                    *first = self.momentum * *first - lr * g;
                    -self.momentum * previous + (1.0 + self.momentum) * *first
                }
                OptimizerMethod::Adagrad => {
                    *first += g * g;
                    -lr * g / (first.sqrt() + eps)
                }
                OptimizerMethod::RmsProp => {
                    *first = self.ro * *first + (1.0 - self.ro) * g * g;
                    -lr * g / (first.sqrt() + eps)
                }
                OptimizerMethod::Adadelta => {
                    *first = self.ro * *first + (1.0 - self.ro) * g * g;
                    let dx = -((*second + eps) / (*first + eps)).sqrt() * g;
                    *second = self.ro * *second + (1.0 - self.ro) * dx * dx;
                    dx
                }
                OptimizerMethod::Adam => {
                    *first = self.beta1 * *first + (1.0 - self.beta1) * g;
                    *second = self.beta2 * *second + (1.0 - self.beta2) * g * g;
                    let m_hat = *first / bias_correction1;
                    let v_hat = *second / bias_correction2;
                    -lr * m_hat / (v_hat.sqrt() + eps)
                }
                OptimizerMethod::AdaMax => {
                    *first = self.beta1 * *first + (1.0 - self.beta1) * g;
                    *second = (self.beta2 * *second).max(g.abs());
                    -(lr / bias_correction1) * *first / (*second + eps)
                }
            };
            pg.parameters[j] += delta;
        }
    }
}
