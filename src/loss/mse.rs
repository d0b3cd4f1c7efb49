use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar cost: 0.5 · Σ (expected - predicted)²
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        expected.zip_map(predicted, |y, p| (y - p).powi(2)).sum() * 0.5
    }

    /// Descent direction -∂L/∂p: expected - predicted
    pub fn descent(predicted: &Matrix, expected: &Matrix) -> Matrix {
        expected.zip_map(predicted, |y, p| y - p)
    }
}
