pub mod mse;
pub mod cross_entropy;
pub mod log_likelihood;
pub mod cost_kind;

pub use mse::MseLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use log_likelihood::LogLikelihoodLoss;
pub use cost_kind::CostKind;
