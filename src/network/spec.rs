use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::kind::{LayerShape, DEFAULT_KEEP_PROB};
use crate::layers::layer::Layer;
use crate::loss::cost_kind::CostKind;

/// Describes one layer of a built graph.
///
/// Fields:
/// - `name`:  registry name (`Sigmoid`, `Dropout`, `MSE`, ...)
/// - `shape`: resolved `(input, output)` widths
/// - `param`: auxiliary configuration (dropout keep probability)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub shape: (usize, usize),
    #[serde(default)]
    pub param: Option<f64>,
}

impl LayerSpec {
    /// Resolves the spec back into a layer value ready for `Network::add`.
    pub fn to_layer(&self) -> Result<Layer> {
        let shape = LayerShape::Full(self.shape.0, self.shape.1);
        if let Ok(activation) = self.name.parse::<ActivationFunction>() {
            return Ok(Layer::root(activation, shape));
        }
        if self.name == "Dropout" {
            return Ok(Layer::dropout(self.param.unwrap_or(DEFAULT_KEEP_PROB))?.with_shape(shape));
        }
        match self.name.parse::<CostKind>() {
            Ok(cost) => Ok(Layer::cost(cost).with_shape(shape)),
            Err(_) => Err(NetworkError::unknown("layer", &self.name)),
        }
    }
}

/// Input to `Network::build`.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildSpec {
    /// Explicit `(name, shape, param)` list, e.g. from a snapshot.
    Layers(Vec<LayerSpec>),
    /// Quick-build: consecutive widths joined by sigmoid layers, cost
    /// appended automatically.
    Widths(Vec<usize>),
}
