use serde::{Serialize, Deserialize};

use crate::error::{NeuralNetError, Result};
use crate::math::matrix::Matrix;

/// Which encoding a learner applies to its raw targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetEncoding {
    /// One unit basis vector per class (classification).
    OneOfN,
    /// Target value copied unchanged (regression).
    Copy,
}

/// Turns raw target values into the matrix the loss compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetEncoder {
    /// `classes` are the distinct targets sorted ascending; class `i` maps to
    /// the basis vector with a one at column `i`.
    OneOfN { classes: Vec<f64> },
    Copy,
}

/// Distinct values of `targets`, sorted ascending.
pub fn ordered_classes(targets: &[f64]) -> Vec<f64> {
    let mut classes = targets.to_vec();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    classes
}

impl TargetEncoder {
    /// Builds the encoder for `encoding` from the full target vector.
    pub fn fit(encoding: TargetEncoding, targets: &[f64]) -> Result<TargetEncoder> {
        if let Some(bad) = targets.iter().find(|t| !t.is_finite()) {
            return Err(NeuralNetError::InvalidData(format!("target {bad} is not finite")));
        }
        Ok(match encoding {
            TargetEncoding::OneOfN => TargetEncoder::OneOfN { classes: ordered_classes(targets) },
            TargetEncoding::Copy => TargetEncoder::Copy,
        })
    }

    /// Number of columns an encoded batch has.
    pub fn width(&self) -> usize {
        match self {
            TargetEncoder::OneOfN { classes } => classes.len(),
            TargetEncoder::Copy => 1,
        }
    }

    /// Encodes one mini-batch of targets, one row per target.
    pub fn encode(&self, targets: &[f64]) -> Result<Matrix> {
        let mut encoded = Matrix::zeros(targets.len(), self.width());
        match self {
            TargetEncoder::OneOfN { classes } => {
                for (row, target) in targets.iter().enumerate() {
                    let class = self.class_index(*target).ok_or_else(|| {
                        NeuralNetError::InvalidData(format!("target {target} is not one of {classes:?}"))
                    })?;
                    encoded.set(row, class, 1.0);
                }
            }
            TargetEncoder::Copy => encoded.data.copy_from_slice(targets),
        }
        Ok(encoded)
    }

    pub fn class_index(&self, target: f64) -> Option<usize> {
        match self {
            TargetEncoder::OneOfN { classes } => classes.binary_search_by(|c| c.total_cmp(&target)).ok(),
            TargetEncoder::Copy => None,
        }
    }

    /// Inverse of the one-of-N encoding: the class at output column `index`.
    pub fn decode(&self, index: usize) -> Option<f64> {
        match self {
            TargetEncoder::OneOfN { classes } => classes.get(index).copied(),
            TargetEncoder::Copy => None,
        }
    }
}
