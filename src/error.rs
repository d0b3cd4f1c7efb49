use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Every way building, training or loading a network can fail.
///
/// All variants are raised synchronously by the call that detects them and
/// abort that call; nothing is retried internally.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A layer was appended after a cost layer closed the graph.
    #[error("cannot add layer '{layer}': the graph was closed by a cost layer")]
    GraphClosed { layer: String },

    /// Layer widths, feature widths or label widths disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A layer, optimizer or metric name is not in its registry.
    #[error("unknown {kind} '{name}'")]
    UnknownKind { kind: &'static str, name: String },

    /// A layer parameter or hyperparameter is malformed or out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Feature/label rows are empty, ragged or of different lengths.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The operation needs at least one layer.
    #[error("the network has no layers; add layers before fitting or predicting")]
    EmptyGraph,

    /// A snapshot could not be loaded. The graph has already been reset.
    #[error("failed to load network ({0}), structure reset")]
    Persistence(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetworkError {
    pub(crate) fn unknown(kind: &'static str, name: &str) -> Self {
        NetworkError::UnknownKind { kind, name: name.to_owned() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = NetworkError::unknown("optimizer", "Adagrad");
        assert_eq!(err.to_string(), "unknown optimizer 'Adagrad'");

        let err = NetworkError::GraphClosed { layer: "Dropout".into() };
        assert!(err.to_string().contains("Dropout"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: NetworkError = io.into();
        assert!(matches!(err, NetworkError::Io(_)));
    }
}
