pub mod split;

pub use split::{split_data, oversample, DataSplit, Partition, SplitConfig};
