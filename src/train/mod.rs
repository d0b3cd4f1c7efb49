pub mod epoch_stats;
pub mod logs;
pub mod train_config;
pub mod step;
pub mod loop_fn;

pub use epoch_stats::EpochStats;
pub use logs::FitLogs;
pub use train_config::TrainConfig;
pub use step::train_step;
