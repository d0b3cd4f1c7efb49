use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::network::spec::{BuildSpec, LayerSpec};
use crate::optim::kind::OptimizerKind;
use crate::train::logs::FitLogs;

/// Everything needed to rebuild a trained graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub layers: Vec<LayerSpec>,
    pub weights: Vec<Matrix>,
    pub bias: Vec<Matrix>,
    #[serde(default)]
    pub optimizer: Option<OptimizerKind>,
    #[serde(default)]
    pub logs: Option<FitLogs>,
}

impl Network {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            layers: self.layer_specs(),
            weights: self.weights.clone(),
            bias: self.bias.clone(),
            optimizer: self.optimizer,
            logs: self.logs.clone(),
        }
    }

    /// Serializes the graph to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.snapshot())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        writer.flush()?;
        Ok(())
    }

    /// Replaces this graph with one previously written by `save_json`.
    ///
    /// On failure the graph is left empty and `Persistence` is returned.
    pub fn load_json(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.reset();
        let path = path.as_ref();
        match self.restore(path) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.reset();
                Err(NetworkError::Persistence(format!("{}: {}", path.display(), err)))
            }
        }
    }

    fn restore(&mut self, path: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Snapshot = serde_json::from_reader(reader)
            .map_err(|e| NetworkError::InvalidData(e.to_string()))?;
        self.install(snapshot)
    }

    /// Rebuilds the structure and installs the stored parameters after
    /// checking every array against it.
    ///
    /// The graph is only replaced once every check has passed; on error it
    /// is left as it was.
    pub fn install(&mut self, snapshot: Snapshot) -> Result<()> {
        let mut staged = self.clone();
        staged.build(BuildSpec::Layers(snapshot.layers))?;

        let n = staged.layers.len();
        if snapshot.weights.len() != n || snapshot.bias.len() != n {
            return Err(NetworkError::ShapeMismatch(format!(
                "{} layers but {} weights and {} bias arrays",
                n, snapshot.weights.len(), snapshot.bias.len()
            )));
        }
        let stored = snapshot.weights.iter().zip(&staged.weights)
            .chain(snapshot.bias.iter().zip(&staged.bias));
        for (i, (saved, built)) in stored.enumerate() {
            if !is_well_formed(saved) || saved.shape() != built.shape() {
                return Err(NetworkError::ShapeMismatch(format!(
                    "stored array {} has shape {:?}, expected {:?}",
                    i, saved.shape(), built.shape()
                )));
            }
        }

        staged.weights = snapshot.weights;
        staged.bias = snapshot.bias;
        staged.optimizer = snapshot.optimizer;
        staged.logs = snapshot.logs;
        *self = staged;
        Ok(())
    }
}

fn is_well_formed(m: &Matrix) -> bool {
    m.data.len() == m.rows && m.data.iter().all(|row| row.len() == m.cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::layer::Layer;

    fn built() -> Network {
        let mut net = Network::new();
        net.build(BuildSpec::Widths(vec![3, 5, 2])).unwrap();
        net
    }

    #[test]
    fn install_rejects_mismatched_arrays() {
        let mut snapshot = built().snapshot();
        snapshot.weights[1] = Matrix::zeros(4, 2);

        let mut net = Network::with_seed(3);
        net.add(Layer::dense(ActivationFunction::Tanh, 2, 2)).unwrap();
        let names = net.layer_names();
        let weights = net.weights().to_vec();

        assert!(matches!(net.install(snapshot), Err(NetworkError::ShapeMismatch(_))));
        assert_eq!(net.layer_names(), names);
        assert_eq!(net.weights(), &weights[..]);
        assert!(!net.is_closed());
    }

    #[test]
    fn install_rejects_ragged_arrays() {
        let mut snapshot = built().snapshot();
        snapshot.bias[0].data[0].pop();
        let mut net = Network::new();
        assert!(net.install(snapshot).is_err());
    }

    #[test]
    fn install_restores_parameters_and_optimizer() {
        let mut source = built();
        source.set_optimizer("Adam").unwrap();
        let snapshot = source.snapshot();

        let mut net = Network::with_seed(7);
        net.install(snapshot.clone()).unwrap();
        assert_eq!(net.snapshot(), snapshot);
    }

    #[test]
    fn snapshot_json_is_bit_exact() {
        let snapshot = built().snapshot();
        let text = serde_json::to_string_pretty(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snapshot);
    }
}
