pub mod kind;
pub mod state;
pub mod sgd;
pub mod momentum;
pub mod adam;
pub mod rmsprop;
pub mod cf0910;

pub use kind::OptimizerKind;
pub use state::{Buffers, Gradient, OptimizerState, StepContext};
