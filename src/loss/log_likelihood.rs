use crate::loss::cross_entropy::clamp;
use crate::math::matrix::Matrix;

/// Negative log-likelihood of one-hot targets under softmax outputs.
pub struct LogLikelihoodLoss;

impl LogLikelihoodLoss {
    /// Computes the scalar cost:
    ///   L = -Σ expected[i] · ln(predicted[i])
    ///
    /// `predicted`: softmax probabilities, shape (batch, n_classes)
    /// `expected`:  one-hot (or soft) targets, same shape
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        -expected.zip_map(predicted, |y, p| y * clamp(p).ln()).sum()
    }

    /// Descent direction -∂L/∂p: y / p
    ///
    /// Composed with a softmax root this is never used: the combined gradient
    /// w.r.t. the logits simplifies to `expected - predicted`.
    pub fn descent(predicted: &Matrix, expected: &Matrix) -> Matrix {
        expected.zip_map(predicted, |y, p| y / clamp(p))
    }
}
