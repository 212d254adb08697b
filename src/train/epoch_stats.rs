use serde::{Serialize, Deserialize};

/// Per-epoch training statistics.
///
/// The training loop logs one of these after every epoch and, when the
/// learner has a progress channel, sends it there as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Mean of the per-batch losses, weighted by batch length.
    pub train_loss: f64,
    /// Fraction of training samples whose argmax matched the target class;
    /// only set for one-of-N targets.
    pub train_accuracy: Option<f64>,
    /// Wall-clock duration of the epoch in milliseconds.
    pub elapsed_ms: u64,
}
