use serde::{Serialize, Deserialize};

/// Metric history of one `fit` call.
///
/// `metrics[i]` holds one validation value of `metric_names[i]` per epoch.
/// `loss` is only filled when the run asked for the validation loss, and
/// the `test*` fields only when logging was enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitLogs {
    pub metric_names: Vec<String>,
    pub metrics: Vec<Vec<f64>>,
    #[serde(default)]
    pub loss: Vec<f64>,
    /// Mean training cost after every epoch, predict mode.
    pub train_loss: Vec<f64>,
    #[serde(default)]
    pub test: Vec<f64>,
    #[serde(default)]
    pub test_loss: Option<f64>,
}

impl FitLogs {
    pub fn new(metric_names: Vec<String>) -> FitLogs {
        let metrics = vec![Vec::new(); metric_names.len()];
        FitLogs { metric_names, metrics, ..FitLogs::default() }
    }

    /// Latest validation value of every metric, paired with its name.
    pub fn latest(&self) -> Vec<(String, f64)> {
        self.metric_names.iter().zip(&self.metrics)
            .filter_map(|(name, values)| values.last().map(|v| (name.clone(), *v)))
            .collect()
    }
}
