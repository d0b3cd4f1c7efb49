pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod loss;
pub mod optim;
pub mod metrics;
pub mod data;
pub mod network;
pub mod train;

// Convenience re-exports
pub use error::{NetworkError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::{Layer, LayerKind, LayerShape};
pub use loss::CostKind;
pub use optim::OptimizerKind;
pub use metrics::Metric;
pub use data::SplitConfig;
pub use network::{BuildSpec, LayerSpec, Network};
pub use train::{train_step, EpochStats, FitLogs, TrainConfig};
