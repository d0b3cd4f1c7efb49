use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::data::split::SplitConfig;
use crate::metrics::Metric;
use crate::optim::kind::OptimizerKind;
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `Network::fit` run.
///
/// # Fields
/// - `optimizer`:     update rule; falls back to the graph's choice, then RMSProp
/// - `epochs`:        number of epochs
/// - `batch_size`:    samples per mini-batch, capped at the training size
/// - `record_period`: epochs between progress reports
/// - `lr`, `lb`:      learning rate and L2 strength
/// - `apply_bias`:    whether bias vectors are trained
/// - `show_loss`:     also log the validation loss
/// - `do_log`:        log `metrics` on the validation and test partitions
/// - `split`:         partitioning and oversampling of the input
/// - `progress_tx`:   optional channel sender; one `EpochStats` per record
///                     period. If the receiver is dropped the run ends early.
/// - `stop_flag`:     optional atomic flag, checked before every epoch.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub optimizer: Option<OptimizerKind>,
    pub epochs: usize,
    pub batch_size: usize,
    pub record_period: usize,
    pub lr: f64,
    pub lb: f64,
    pub apply_bias: bool,
    pub show_loss: bool,
    pub do_log: bool,
    pub metrics: Vec<Metric>,
    pub split: SplitConfig,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            optimizer: None,
            epochs: 20,
            batch_size: 512,
            record_period: 1,
            lr: 0.01,
            lb: 0.01,
            apply_bias: true,
            show_loss: false,
            do_log: false,
            metrics: vec![Metric::Accuracy],
            split: SplitConfig::default(),
            progress_tx: None,
            stop_flag: None,
        }
    }
}

impl TrainConfig {
    /// Default configuration with the given epochs, batch size and optimizer.
    pub fn new(epochs: usize, batch_size: usize, optimizer: Option<OptimizerKind>) -> Self {
        TrainConfig {
            optimizer,
            epochs,
            batch_size,
            ..TrainConfig::default()
        }
    }

    /// Train, validate and test on the whole dataset.
    pub fn train_only(mut self) -> Self {
        self.split.train_only = true;
        self
    }
}
