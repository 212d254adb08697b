pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod encoders;
pub mod optim;
pub mod train;
pub mod learners;
pub mod models;

// Convenience re-exports
pub use error::{NeuralNetError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::{
    ActivationLayer, BatchNormLayer, Conv2DLayer, DenseLayer, DropoutLayer, InputLayer, Layer,
    LayerShape, MaxPoolLayer, SoftmaxLayer, SquaredErrorRegressionLayer,
};
pub use network::{NeuralNet, NetworkSpec};
pub use loss::loss_type::LossType;
pub use optim::{NeuralNetOptimizer, OptimizerMethod};
pub use train::{EpochStats, NeuralNetLearner, NeuralNetLearnerConfig};
pub use learners::{ClassificationNeuralNetLearner, IndexedLearner, Learner, RegressionNeuralNetLearner};
pub use models::{
    ClassificationNeuralNetModel, NeuralNetModel, PredictorModel, ProbabilityPrediction,
    RegressionNeuralNetModel,
};
