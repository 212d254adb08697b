use std::sync::mpsc;
use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::encoders::{TargetEncoder, TargetEncoding};
use crate::error::{NeuralNetError, Result};
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::models::NeuralNetModel;
use crate::network::network::NeuralNet;
use crate::optim::optimizer::NeuralNetOptimizer;
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::{run_one_epoch, TrainingSet};
use crate::train::train_config::NeuralNetLearnerConfig;

/// Mini-batch trainer shared by the classification and regression learners.
///
/// Holds an uninitialized network template; every `learn` call trains a
/// fresh copy of it, so one learner can be reused across data sets.
#[derive(Debug, Clone)]
pub struct NeuralNetLearner {
    net: NeuralNet,
    encoding: TargetEncoding,
    loss: LossType,
    config: NeuralNetLearnerConfig,
    progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl NeuralNetLearner {
    pub fn new(
        net: NeuralNet,
        encoding: TargetEncoding,
        loss: LossType,
        config: NeuralNetLearnerConfig,
    ) -> Result<NeuralNetLearner> {
        config.validate()?;
        net.output_shapes()?;
        Ok(NeuralNetLearner { net, encoding, loss, config, progress_tx: None })
    }

    /// Sends one `EpochStats` per completed epoch to `tx`.
    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &NeuralNetLearnerConfig {
        &self.config
    }

    pub fn net(&self) -> &NeuralNet {
        &self.net
    }

    pub fn loss(&self) -> LossType {
        self.loss
    }

    /// Trains on the rows of `observations` selected by `indices` and
    /// returns the batch-size-1 prediction network.
    ///
    /// `targets[i]` is the target of row `i`. The target encoding is fitted
    /// on all of `targets`; only the training rows are restricted to
    /// `indices`. With `iterations == 0` the result is the freshly
    /// initialized network.
    pub fn learn(&self, observations: &Matrix, targets: &[f64], indices: &[usize]) -> Result<NeuralNetModel> {
        self.check_data(observations, targets, indices)?;

        // fitted on every target, not only the selected rows
        let encoder = TargetEncoder::fit(self.encoding, targets)?;

        let batch_size = self.config.batch_size.min(indices.len());
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut net = self.net.clone();
        net.initialize(batch_size, &mut rng)?;

        if encoder.width() != net.output_units() {
            return Err(NeuralNetError::InvalidData(format!(
                "targets encode to {} columns but the network emits {}",
                encoder.width(),
                net.output_units()
            )));
        }

        debug!(
            "training {} layers on {} samples, batch size {batch_size}, {:?}",
            net.layers.len(),
            indices.len(),
            self.config.optimizer_method
        );

        let mut optimizer = NeuralNetOptimizer::from_config(&self.config);
        let data = TrainingSet { observations, targets, encoder: &encoder, loss: self.loss };
        let mut order = indices.to_vec();
        let mut progress_tx = self.progress_tx.clone();

        for epoch in 1..=self.config.iterations {
            let t_start = Instant::now();
            let outcome = run_one_epoch(&mut net, &mut optimizer, &data, &mut order, batch_size, &mut rng)?;
            let elapsed_ms = t_start.elapsed().as_millis() as u64;

            if !outcome.loss.is_finite() {
                warn!("epoch {epoch}: loss is {}", outcome.loss);
            }
            match outcome.accuracy {
                Some(accuracy) => info!(
                    "epoch {epoch}/{}: loss {:.6}, accuracy {:.4} ({elapsed_ms} ms)",
                    self.config.iterations, outcome.loss, accuracy
                ),
                None => info!(
                    "epoch {epoch}/{}: loss {:.6} ({elapsed_ms} ms)",
                    self.config.iterations, outcome.loss
                ),
            }

            if let Some(tx) = &progress_tx {
                let stats = EpochStats {
                    epoch,
                    total_epochs: self.config.iterations,
                    train_loss: outcome.loss,
                    train_accuracy: outcome.accuracy,
                    elapsed_ms,
                };
                if tx.send(stats).is_err() {
                    debug!("progress receiver dropped, no further epoch stats are sent");
                    progress_tx = None;
                }
            }
        }

        Ok(NeuralNetModel::new(net.copy_for_prediction()))
    }

    fn check_data(&self, observations: &Matrix, targets: &[f64], indices: &[usize]) -> Result<()> {
        if observations.rows != targets.len() {
            return Err(NeuralNetError::InvalidData(format!(
                "{} observations but {} targets",
                observations.rows,
                targets.len()
            )));
        }
        if indices.is_empty() {
            return Err(NeuralNetError::InvalidData("no training samples".to_string()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= observations.rows) {
            return Err(NeuralNetError::InvalidData(format!(
                "index {bad} out of range for {} observations",
                observations.rows
            )));
        }
        let features = self.net.input_shape()?.units();
        if observations.cols != features {
            return Err(NeuralNetError::InvalidData(format!(
                "observations have {} columns, input layer expects {features}",
                observations.cols
            )));
        }
        Ok(())
    }
}
