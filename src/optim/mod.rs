pub mod optimizer;
pub mod optimizer_method;

pub use optimizer::{NeuralNetOptimizer, OptimizerState};
pub use optimizer_method::OptimizerMethod;
