pub mod network;
pub mod spec;

pub use network::NeuralNet;
pub use spec::{LayerKind, LayerSpec, NetworkSpec};
