pub mod kind;
pub mod layer;
pub mod registry;

pub use kind::{LayerKind, LayerShape, DEFAULT_KEEP_PROB};
pub use layer::{Layer, LayerOutput, Pass};
