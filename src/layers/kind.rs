use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::loss::cost_kind::CostKind;

/// Retention probability used when a Dropout layer is added without one.
pub const DEFAULT_KEEP_PROB: f64 = 0.5;

/// The closed set of layer variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LayerKind {
    /// Affine transform followed by an activation; owns a weight/bias pair.
    Root(ActivationFunction),
    /// Sub-layer that keeps each unit with probability `keep_prob` while training.
    Dropout { keep_prob: f64 },
    /// Terminal sub-layer computing the training objective.
    Cost(CostKind),
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Root(act) => act.name(),
            LayerKind::Dropout { .. } => "Dropout",
            LayerKind::Cost(cost) => cost.name(),
        }
    }

    pub fn is_sub_layer(&self) -> bool {
        !matches!(self, LayerKind::Root(_))
    }

    pub fn is_cost(&self) -> bool {
        matches!(self, LayerKind::Cost(_))
    }

    /// Auxiliary configuration stored in `layer_params`.
    pub fn param(&self) -> Option<f64> {
        match self {
            LayerKind::Dropout { keep_prob } => Some(*keep_prob),
            _ => None,
        }
    }
}

/// Declared shape of a layer before it joins a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerShape {
    /// `(input, output)` widths.
    Full(usize, usize),
    /// Output width only; the input width comes from the graph.
    Output(usize),
    /// Sub-layer created by name: takes the graph's current width.
    Inherit,
}
