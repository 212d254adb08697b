use crate::math::matrix::Matrix;

pub struct HuberLoss;

// δ is fixed at 1.0
const DELTA: f64 = 1.0;

impl HuberLoss {
    /// Scalar Huber: Σ h(predicted − expected) averaged over batch rows,
    /// where h(x) = 0.5·x²  if |x| ≤ δ
    ///              δ·(|x| − 0.5·δ)  otherwise
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        assert_eq!(predicted.shape(), expected.shape(), "prediction and target shapes differ");
        let n = predicted.rows.max(1) as f64;
        predicted.data.iter().zip(&expected.data)
            .map(|(p, y)| {
                let x = p - y;
                if x.abs() <= DELTA {
                    0.5 * x * x
                } else {
                    DELTA * (x.abs() - 0.5 * DELTA)
                }
            })
            .sum::<f64>() / n
    }

    /// Gradient: x / rows  if |x| ≤ δ,  else δ·sign(x) / rows
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = predicted.rows.max(1) as f64;
        Matrix::from_vec(
            predicted.rows,
            predicted.cols,
            predicted.data.iter().zip(&expected.data)
                .map(|(p, y)| {
                    let x = p - y;
                    if x.abs() <= DELTA { x / n } else { DELTA * x.signum() / n }
                })
                .collect(),
        )
    }
}
