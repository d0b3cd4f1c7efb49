use crate::math::matrix::Matrix;

/// Cross-entropy over independent sigmoid outputs.
pub struct CrossEntropyLoss;

/// Predictions are clamped into [EPS, 1 - EPS] before any log() or division.
pub(crate) const EPS: f64 = 1e-12;

pub(crate) fn clamp(p: f64) -> f64 {
    p.clamp(EPS, 1.0 - EPS)
}

impl CrossEntropyLoss {
    /// Scalar cost: -Σ [y·ln(p) + (1-y)·ln(1-p)]
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        -expected
            .zip_map(predicted, |y, p| {
                let p = clamp(p);
                y * p.ln() + (1.0 - y) * (1.0 - p).ln()
            })
            .sum()
    }

    /// Descent direction -∂L/∂p: y/p - (1-y)/(1-p)
    ///
    /// Only used when the terminal root is not a sigmoid; with a sigmoid root
    /// the seed delta collapses to `expected - predicted`.
    pub fn descent(predicted: &Matrix, expected: &Matrix) -> Matrix {
        expected.zip_map(predicted, |y, p| {
            let p = clamp(p);
            y / p - (1.0 - y) / (1.0 - p)
        })
    }
}
