use crate::math::matrix::Matrix;

pub struct MaeLoss;

impl MaeLoss {
    /// Scalar loss: Σ|predicted - expected| averaged over batch rows.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        assert_eq!(predicted.shape(), expected.shape(), "prediction and target shapes differ");
        let n = predicted.rows.max(1) as f64;
        predicted.data.iter().zip(&expected.data)
            .map(|(p, y)| (p - y).abs())
            .sum::<f64>() / n
    }

    /// Subgradient: sign(p - y) / rows  (0 when equal)
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = predicted.rows.max(1) as f64;
        Matrix::from_vec(
            predicted.rows,
            predicted.cols,
            predicted.data.iter().zip(&expected.data)
                .map(|(p, y)| {
                    let diff = p - y;
                    if diff > 0.0 { 1.0 / n } else if diff < 0.0 { -1.0 / n } else { 0.0 }
                })
                .collect(),
        )
    }
}
