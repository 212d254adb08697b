pub mod mse;
pub mod cross_entropy;
pub mod huber;
pub mod mae;
pub mod loss_type;

pub use mse::MseLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use huber::HuberLoss;
pub use mae::MaeLoss;
pub use loss_type::LossType;
