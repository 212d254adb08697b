pub mod target_encoder;

pub use target_encoder::{ordered_classes, TargetEncoder, TargetEncoding};
