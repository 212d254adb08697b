use serde::{Serialize, Deserialize};

/// Update rule applied by `NeuralNetOptimizer`.
///
/// - `Sgd`     : plain gradient step.
/// - `Momentum`: SGD with a velocity term (`momentum`).
/// - `Nesterov`: Nesterov accelerated momentum.
/// - `Adagrad` : per-weight rate scaled by the accumulated squared gradient.
/// - `RmsProp` : Adagrad with a decaying accumulator (`ro`).
/// - `Adadelta`: unit-corrected RmsProp (`ro`); ignores the learning rate.
/// - `Adam`    : bias-corrected first/second moments (`beta1`, `beta2`).
/// - `AdaMax`  : Adam with an infinity-norm second moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerMethod {
    Sgd,
    Momentum,
    Nesterov,
    #[default]
    Adagrad,
    RmsProp,
    Adadelta,
    Adam,
    AdaMax,
}
