pub mod network;
pub mod spec;
pub mod snapshot;

pub use network::{Network, LayerView, DEFAULT_SEED};
pub use spec::{BuildSpec, LayerSpec};
pub use snapshot::Snapshot;
