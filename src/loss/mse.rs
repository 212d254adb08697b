use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar loss: ½·Σ(predicted - expected)² averaged over batch rows.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        assert_eq!(predicted.shape(), expected.shape(), "prediction and target shapes differ");
        let n = predicted.rows.max(1) as f64;
        predicted.data.iter().zip(&expected.data)
            .map(|(a, b)| 0.5 * (a - b).powi(2))
            .sum::<f64>() / n
    }

    /// Gradient: (predicted - expected) / rows
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = predicted.rows.max(1) as f64;
        Matrix::from_vec(
            predicted.rows,
            predicted.cols,
            predicted.data.iter().zip(&expected.data).map(|(a, b)| (a - b) / n).collect(),
        )
    }
}
