use crate::math::matrix::Matrix;

/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Probabilities are clamped to this floor inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss averaged over batch rows:
    ///   L = -Σ expected[i] * log(max(predicted[i], eps)) / rows
    ///
    /// `predicted`: softmax probabilities, one row per sample
    /// `expected` : one-hot (or soft) target distribution, same shape
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        assert_eq!(predicted.shape(), expected.shape(), "prediction and target shapes differ");
        let n = predicted.rows.max(1) as f64;
        predicted.data.iter().zip(&expected.data)
            .map(|(p, e)| -e * p.max(EPS).ln())
            .sum::<f64>() / n
    }

    /// Gradient with respect to the probabilities: -expected / max(p, eps) / rows.
    ///
    /// The Softmax layer applies its own Jacobian in `backward`, so the
    /// composed gradient at the logits reduces to (p - expected) / rows.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = predicted.rows.max(1) as f64;
        Matrix::from_vec(
            predicted.rows,
            predicted.cols,
            predicted.data.iter().zip(&expected.data)
                .map(|(p, e)| -e / p.max(EPS) / n)
                .collect(),
        )
    }
}
