pub mod metric;

pub use metric::Metric;
