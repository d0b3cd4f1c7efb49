use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::activation::activation::ActivationFunction;
use crate::error::NetworkError;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::log_likelihood::LogLikelihoodLoss;
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;

/// Objective computed by the terminal cost layer.
///
/// - `Mse`:           0.5·Σ(y-p)²; the default for non-probabilistic outputs.
/// - `CrossEntropy`:  pairs with a Sigmoid terminal root.
/// - `LogLikelihood`: pairs with a Softmax terminal root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostKind {
    Mse,
    CrossEntropy,
    LogLikelihood,
}

impl CostKind {
    pub const ALL: [CostKind; 3] = [CostKind::Mse, CostKind::CrossEntropy, CostKind::LogLikelihood];

    pub fn name(&self) -> &'static str {
        match self {
            CostKind::Mse => "MSE",
            CostKind::CrossEntropy => "Cross Entropy",
            CostKind::LogLikelihood => "Log Likelihood",
        }
    }

    /// Cost chosen automatically when a graph is finalized without one.
    pub fn for_root(root: ActivationFunction) -> CostKind {
        match root {
            ActivationFunction::Sigmoid => CostKind::CrossEntropy,
            ActivationFunction::Softmax => CostKind::LogLikelihood,
            _ => CostKind::Mse,
        }
    }

    /// Whether the (root, cost) pair has the closed-form seed `y - p`.
    pub fn is_matched(&self, root: ActivationFunction) -> bool {
        matches!(
            (root, self),
            (ActivationFunction::Sigmoid, CostKind::CrossEntropy)
                | (ActivationFunction::Softmax, CostKind::LogLikelihood)
        )
    }

    /// Summed (not averaged) cost of a batch.
    pub fn calculate(&self, target: &Matrix, prediction: &Matrix) -> f64 {
        match self {
            CostKind::Mse => MseLoss::loss(prediction, target),
            CostKind::CrossEntropy => CrossEntropyLoss::loss(prediction, target),
            CostKind::LogLikelihood => LogLikelihoodLoss::loss(prediction, target),
        }
    }

    /// Descent direction of the cost with respect to the prediction.
    pub fn descent(&self, target: &Matrix, prediction: &Matrix) -> Matrix {
        match self {
            CostKind::Mse => MseLoss::descent(prediction, target),
            CostKind::CrossEntropy => CrossEntropyLoss::descent(prediction, target),
            CostKind::LogLikelihood => LogLikelihoodLoss::descent(prediction, target),
        }
    }

    /// Seed delta at the terminal root's pre-activation, oriented along the
    /// descent direction.
    ///
    /// Matched pairs use the algebraic simplification `target - prediction`.
    /// Every other pair chains the cost's descent direction through the
    /// root's derivative evaluated at `root_output`, the terminal root's own
    /// forward output. It differs from `prediction` when a dropout sits
    /// between the root and the cost.
    pub fn bp_first(
        &self,
        root: ActivationFunction,
        root_output: &Matrix,
        target: &Matrix,
        prediction: &Matrix,
    ) -> Matrix {
        if self.is_matched(root) {
            return target.zip_map(prediction, |y, p| y - p);
        }
        self.descent(target, prediction).hadamard(&root.derivative_matrix(root_output))
    }
}

impl fmt::Display for CostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CostKind {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CostKind::ALL
            .into_iter()
            .find(|cost| cost.name() == s)
            .ok_or_else(|| NetworkError::unknown("cost layer", s))
    }
}
