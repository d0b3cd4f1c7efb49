use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NetworkError;
use crate::math::matrix::Matrix;

/// Evaluation metrics comparing one-hot labels against network outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Accuracy,
    /// Binary F1 where argmax index 1 is the positive class.
    F1,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "acc",
            Metric::F1 => "f1_score",
        }
    }

    pub fn evaluate(&self, y: &Matrix, y_pred: &Matrix) -> f64 {
        let truth = y.argmax_rows();
        let guess = y_pred.argmax_rows();
        if truth.is_empty() {
            return 0.0;
        }
        match self {
            Metric::Accuracy => accuracy(&truth, &guess),
            Metric::F1 => f1_score(&truth, &guess),
        }
    }
}

fn accuracy(truth: &[usize], guess: &[usize]) -> f64 {
    let hits = truth.iter().zip(guess).filter(|(t, g)| t == g).count();
    hits as f64 / truth.len() as f64
}

fn f1_score(truth: &[usize], guess: &[usize]) -> f64 {
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (&t, &g) in truth.iter().zip(guess) {
        match (t == 1, g == 1) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    if tp == 0 {
        return 0.0;
    }
    let tp = tp as f64;
    2.0 * tp / (2.0 * tp + fp as f64 + fn_ as f64)
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "acc" | "accuracy" => Ok(Metric::Accuracy),
            "f1" | "f1_score" => Ok(Metric::F1),
            _ => Err(NetworkError::unknown("metric", s)),
        }
    }
}
