use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NetworkError;
use crate::math::matrix::Matrix;

/// Activation applied by a root layer after its affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationFunction {
    Identity,
    Sigmoid,
    Tanh,
    ReLU,
    /// Exponential linear unit with α = 1.
    Elu,
    Softplus,
    /// Row-wise softmax. Applied at the matrix level in [`apply`](Self::apply),
    /// never element-wise.
    Softmax,
}

impl ActivationFunction {
    pub const ALL: [ActivationFunction; 7] = [
        ActivationFunction::Identity,
        ActivationFunction::Sigmoid,
        ActivationFunction::Tanh,
        ActivationFunction::ReLU,
        ActivationFunction::Elu,
        ActivationFunction::Softplus,
        ActivationFunction::Softmax,
    ];

    /// Registry name of the layer kind.
    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Identity => "Identical",
            ActivationFunction::Sigmoid => "Sigmoid",
            ActivationFunction::Tanh => "Tanh",
            ActivationFunction::ReLU => "ReLU",
            ActivationFunction::Elu => "ELU",
            ActivationFunction::Softplus => "Softplus",
            ActivationFunction::Softmax => "Softmax",
        }
    }

    /// Applies the activation to a batch of pre-activations.
    pub fn apply(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Softmax => softmax(z),
            _ => z.map(|x| self.function(x)),
        }
    }

    /// Element-wise activation. Softmax is handled row-wise by `apply`.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => x,
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Elu => if x > 0.0 { x } else { x.exp_m1() },
            // ln(1 + e^x) without overflowing for large x.
            ActivationFunction::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
            // A lone value normalizes to 1; whole rows go through `apply`.
            ActivationFunction::Softmax => 1.0,
        }
    }

    /// Derivative of the activation w.r.t. its input, expressed through the
    /// cached forward output `y`.
    ///
    /// For `Softmax` this is the diagonal term `y·(1-y)`. A softmax closed by
    /// the log-likelihood cost never reaches it: that seed delta already
    /// accounts for the full Jacobian.
    pub fn derivative(&self, y: f64) -> f64 {
        match self {
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Sigmoid => y * (1.0 - y),
            ActivationFunction::Tanh => 1.0 - y * y,
            ActivationFunction::ReLU => if y > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Elu => if y > 0.0 { 1.0 } else { y + 1.0 },
            // σ(x) recovered from y = ln(1 + e^x).
            ActivationFunction::Softplus => -(-y).exp_m1(),
            ActivationFunction::Softmax => y * (1.0 - y),
        }
    }

    /// `derivative` mapped over a batch of outputs.
    pub fn derivative_matrix(&self, y: &Matrix) -> Matrix {
        y.map(|v| self.derivative(v))
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationFunction {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivationFunction::ALL
            .into_iter()
            .find(|act| act.name() == s)
            .ok_or_else(|| NetworkError::unknown("layer", s))
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Row-wise softmax with the row max subtracted first.
fn softmax(z: &Matrix) -> Matrix {
    let data = z.data.iter()
        .map(|row| {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = row.iter().map(|x| (x - max).exp()).collect();
            let sum: f64 = exps.iter().sum();
            exps.into_iter().map(|e| e / sum).collect()
        })
        .collect();
    Matrix { rows: z.rows, cols: z.cols, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    const H: f64 = 1e-5;

    #[test]
    fn derivatives_match_central_differences() {
        let mut rng = StdRng::seed_from_u64(142857);
        for act in ActivationFunction::ALL {
            if act == ActivationFunction::Softmax {
                continue;
            }
            for _ in 0..200 {
                // Stay clear of the ReLU/ELU kink at zero.
                let mut x: f64 = rng.gen_range(-4.0..4.0);
                if x.abs() < 1e-3 {
                    x = 0.5;
                }
                let numeric = (act.function(x + H) - act.function(x - H)) / (2.0 * H);
                let analytic = act.derivative(act.function(x));
                assert!(
                    (numeric - analytic).abs() < 1e-5,
                    "{act} at {x}: numeric {numeric}, analytic {analytic}"
                );
            }
        }
    }

    #[test]
    fn softmax_rows_are_distributions_and_shift_invariant() {
        let z = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![-1.0, 0.0, 0.5]]);
        let shifted = z.map(|x| x + 100.0);
        let a = ActivationFunction::Softmax.apply(&z);
        let b = ActivationFunction::Softmax.apply(&shifted);
        for (ra, rb) in a.data.iter().zip(b.data.iter()) {
            assert!((ra.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            for (x, y) in ra.iter().zip(rb.iter()) {
                assert!((x - y).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn softmax_survives_huge_logits() {
        let z = Matrix::from_data(vec![vec![1000.0, 1000.0, -1000.0]]);
        let y = ActivationFunction::Softmax.apply(&z);
        assert!(y.data[0].iter().all(|v| v.is_finite()));
        assert!((y.data[0][0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn softplus_and_sigmoid_are_stable_at_extremes() {
        assert_eq!(ActivationFunction::Softplus.function(800.0), 800.0);
        assert!(ActivationFunction::Softplus.function(-800.0) >= 0.0);
        assert_eq!(ActivationFunction::Sigmoid.function(-800.0), 0.0);
        assert_eq!(ActivationFunction::Sigmoid.function(800.0), 1.0);
    }

    #[test]
    fn names_round_trip_through_the_registry() {
        for act in ActivationFunction::ALL {
            assert_eq!(act.name().parse::<ActivationFunction>().unwrap(), act);
        }
        assert!(matches!(
            "Swish".parse::<ActivationFunction>(),
            Err(NetworkError::UnknownKind { .. })
        ));
    }
}
