use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::encoders::TargetEncoder;
use crate::error::Result;
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::network::network::NeuralNet;
use crate::optim::optimizer::NeuralNetOptimizer;

/// Loss and accuracy of one pass over the training indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochOutcome {
    pub loss: f64,
    pub accuracy: Option<f64>,
}

/// Training data shared by every epoch of one run.
pub struct TrainingSet<'a> {
    pub observations: &'a Matrix,
    pub targets: &'a [f64],
    pub encoder: &'a TargetEncoder,
    pub loss: LossType,
}

/// Runs one epoch of mini-batch training over `indices`.
///
/// The indices are shuffled in place first. Batches of `batch_size` rows are
/// taken in order; a shorter final batch temporarily resizes the network,
/// which is restored before returning.
///
/// Per batch: gather rows, encode targets, forward, loss, loss gradient,
/// backward, one optimizer step.
pub fn run_one_epoch<R: Rng + ?Sized>(
    net: &mut NeuralNet,
    optimizer: &mut NeuralNetOptimizer,
    data: &TrainingSet<'_>,
    indices: &mut [usize],
    batch_size: usize,
    rng: &mut R,
) -> Result<EpochOutcome> {
    indices.shuffle(rng);

    let mut total_loss = 0.0;
    let mut correct = 0usize;
    let one_of_n = matches!(data.encoder, TargetEncoder::OneOfN { .. });

    for batch_indices in indices.chunks(batch_size) {
        if batch_indices.len() != net.batch_size() {
            debug!("resizing batch {} -> {}", net.batch_size(), batch_indices.len());
            net.set_batch_size(batch_indices.len());
        }

        let inputs = data.observations.select_rows(batch_indices);
        let batch_targets: Vec<f64> = batch_indices.iter().map(|&i| data.targets[i]).collect();
        let expected = data.encoder.encode(&batch_targets)?;

        let output = net.forward(&inputs);
        total_loss += data.loss.loss(&output, &expected) * batch_indices.len() as f64;

        if one_of_n {
            correct += output
                .row_argmax()
                .iter()
                .zip(&batch_targets)
                .filter(|&(&predicted, &target)| data.encoder.class_index(target) == Some(predicted))
                .count();
        }

        let gradient = data.loss.gradient(&output, &expected);
        net.backward(&gradient);

        let mut parameters_and_gradients = net.parameters_and_gradients();
        optimizer.update(&mut parameters_and_gradients);
    }

    if net.batch_size() != batch_size {
        debug!("restoring batch size {batch_size}");
        net.set_batch_size(batch_size);
    }

    let n = indices.len() as f64;
    Ok(EpochOutcome {
        loss: total_loss / n,
        accuracy: one_of_n.then(|| correct as f64 / n),
    })
}
