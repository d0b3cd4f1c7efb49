use serde::{Serialize, Deserialize};

/// Statistics sent on the progress channel every `record_period` epochs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Mean training cost over the training partition, predict mode.
    pub train_loss: f64,
    /// Latest validation metric values by name; empty unless logging.
    pub val_metrics: Vec<(String, f64)>,
    pub val_loss: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
