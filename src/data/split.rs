use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;

/// How `fit` partitions its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Train, validate and test on the full dataset.
    pub train_only: bool,
    pub training_scale: f64,
    pub cv_scale: f64,
    /// Rebalance a two-class training partition.
    pub oversample: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            train_only: false,
            training_scale: 0.8,
            cv_scale: 0.1,
            oversample: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub x: Matrix,
    pub y: Matrix,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.x.rows
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    fn select(&self, indices: &[usize]) -> Partition {
        Partition {
            x: self.x.select_rows(indices),
            y: self.y.select_rows(indices),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSplit {
    pub train: Partition,
    pub validation: Partition,
    pub test: Partition,
}

/// Shuffles and cuts `(x, y)` into train / validation / test partitions.
pub fn split_data(x: &Matrix, y: &Matrix, cfg: &SplitConfig, rng: &mut StdRng) -> Result<DataSplit> {
    if x.rows != y.rows {
        return Err(NetworkError::InvalidData(format!(
            "{} feature rows but {} label rows", x.rows, y.rows
        )));
    }
    if x.is_empty() {
        return Err(NetworkError::InvalidData("no samples to split".into()));
    }

    let full = Partition { x: x.clone(), y: y.clone() };
    let mut split = if cfg.train_only {
        DataSplit {
            train: full.clone(),
            validation: full.clone(),
            test: full,
        }
    } else {
        let scales_ok = cfg.training_scale > 0.0
            && cfg.cv_scale >= 0.0
            && cfg.training_scale + cfg.cv_scale <= 1.0;
        if !scales_ok {
            return Err(NetworkError::InvalidParameter(format!(
                "training_scale {} and cv_scale {} must be non-negative and sum to at most 1",
                cfg.training_scale, cfg.cv_scale
            )));
        }
        let n = x.rows;
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let train_end = (n as f64 * cfg.training_scale).floor() as usize;
        let cv_end = train_end + (n as f64 * cfg.cv_scale).floor() as usize;
        if train_end == 0 {
            return Err(NetworkError::InvalidData(format!(
                "{} samples leave an empty training partition at scale {}", n, cfg.training_scale
            )));
        }

        DataSplit {
            train: full.select(&order[..train_end]),
            validation: full.select(&order[train_end..cv_end]),
            test: full.select(&order[cv_end..]),
        }
    };

    if cfg.oversample {
        split.train = oversample(&split.train, rng)?;
    }
    Ok(split)
}

/// Resamples the minority class of a two-column one-hot set, with
/// replacement, until both classes hold the majority count; then shuffles.
pub fn oversample(part: &Partition, rng: &mut StdRng) -> Result<Partition> {
    if part.y.cols != 2 {
        return Err(NetworkError::InvalidParameter(format!(
            "oversampling needs exactly 2 label columns, {} found", part.y.cols
        )));
    }

    let (mut zeros, mut ones) = (Vec::new(), Vec::new());
    for (i, class) in part.y.argmax_rows().into_iter().enumerate() {
        if class == 0 { zeros.push(i) } else { ones.push(i) }
    }
    let (majority, minority) = if zeros.len() >= ones.len() { (zeros, ones) } else { (ones, zeros) };
    if minority.is_empty() {
        return Err(NetworkError::InvalidParameter(
            "oversampling needs at least one sample of each class".into()
        ));
    }

    let mut indices = majority.clone();
    indices.extend((0..majority.len()).map(|_| minority[rng.gen_range(0..minority.len())]));
    indices.shuffle(rng);
    Ok(part.select(&indices))
}
