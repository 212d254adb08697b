pub mod epoch_stats;
pub mod learner;
pub mod loop_fn;
pub mod train_config;

pub use epoch_stats::EpochStats;
pub use learner::NeuralNetLearner;
pub use train_config::NeuralNetLearnerConfig;
