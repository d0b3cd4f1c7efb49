use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NetworkError;

/// Registry of update rules selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OptimizerKind {
    Sgd,
    Momentum,
    Nag,
    Adam,
    #[default]
    RmsProp,
    Cf0910,
}

impl OptimizerKind {
    pub const ALL: [OptimizerKind; 6] = [
        OptimizerKind::Sgd,
        OptimizerKind::Momentum,
        OptimizerKind::Nag,
        OptimizerKind::Adam,
        OptimizerKind::RmsProp,
        OptimizerKind::Cf0910,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::Sgd => "SGD",
            OptimizerKind::Momentum => "Momentum",
            OptimizerKind::Nag => "NAG",
            OptimizerKind::Adam => "Adam",
            OptimizerKind::RmsProp => "RMSProp",
            OptimizerKind::Cf0910 => "CF0910",
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizerKind {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptimizerKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| NetworkError::unknown("optimizer", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names() {
        assert_eq!("RMSProp".parse::<OptimizerKind>().unwrap(), OptimizerKind::RmsProp);
        assert_eq!("CF0910".parse::<OptimizerKind>().unwrap(), OptimizerKind::Cf0910);
        assert!("rmsprop".parse::<OptimizerKind>().is_err());
        assert_eq!(OptimizerKind::default(), OptimizerKind::RmsProp);
    }
}
