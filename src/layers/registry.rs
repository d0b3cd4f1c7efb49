use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::kind::DEFAULT_KEEP_PROB;
use crate::layers::layer::Layer;
use crate::loss::cost_kind::CostKind;

/// Names accepted by [`resolve`] for sub-layers.
pub const SUB_LAYER_NAMES: [&str; 4] = ["Dropout", "MSE", "Cross Entropy", "Log Likelihood"];

/// Builds a layer from its registry name.
///
/// - Root names (`Sigmoid`, `ReLU`, ...) take their output width as `param`.
/// - `Dropout` takes an optional keep probability (default 0.5).
/// - Cost names take no parameter.
pub fn resolve(name: &str, param: Option<&str>) -> Result<Layer> {
    if let Ok(activation) = name.parse::<ActivationFunction>() {
        let raw = param.ok_or_else(|| NetworkError::InvalidParameter(format!(
            "{} needs its output width as parameter", name
        )))?;
        let width = raw.trim().parse::<usize>().ok().filter(|w| *w > 0).ok_or_else(|| {
            NetworkError::InvalidParameter(format!(
                "invalid output width for {}: '{}'", name, raw
            ))
        })?;
        return Ok(Layer::stacked(activation, width));
    }

    if name == "Dropout" {
        let keep_prob = match param {
            None => DEFAULT_KEEP_PROB,
            Some(raw) => raw.trim().parse::<f64>().map_err(|err| {
                NetworkError::InvalidParameter(format!(
                    "invalid parameter for Dropout: '{}' ({})", raw, err
                ))
            })?,
        };
        return Layer::dropout(keep_prob);
    }

    match name.parse::<CostKind>() {
        Ok(cost) => Ok(Layer::cost(cost)),
        Err(_) => Err(NetworkError::unknown("layer", name)),
    }
}
