use crate::math::matrix::Matrix;
use crate::optim::adam::AdamState;
use crate::optim::cf0910::Cf0910State;
use crate::optim::kind::OptimizerKind;
use crate::optim::momentum::MomentumState;
use crate::optim::rmsprop::RmsPropState;
use crate::optim::sgd::Sgd;

/// Per-parameter auxiliary buffers, one pair per weight/bias slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffers {
    pub weights: Vec<Matrix>,
    pub bias: Vec<Matrix>,
}

impl Buffers {
    pub fn zeros_like(weights: &[Matrix], bias: &[Matrix]) -> Buffers {
        Buffers {
            weights: weights.iter().map(|w| Matrix::zeros(w.rows, w.cols)).collect(),
            bias: bias.iter().map(|b| Matrix::zeros(b.rows, b.cols)).collect(),
        }
    }
}

/// Ascent-direction gradient of one root layer for one batch.
///
/// `weight = aᵀ·δ`, `bias = Σ_rows δ`, where `δ` points towards the target.
#[derive(Debug, Clone)]
pub struct Gradient {
    pub weight: Matrix,
    pub bias: Matrix,
}

impl Gradient {
    pub fn new(activation: &Matrix, delta: &Matrix) -> Gradient {
        Gradient {
            weight: activation.t_dot(delta),
            bias: delta.sum_rows(),
        }
    }
}

/// Hyper-parameters applied to every update of one batch.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub lr: f64,
    /// Weight-decay factor `1 - lb·lr/batch_size`, applied before the update.
    pub regularization: f64,
    pub apply_bias: bool,
}

impl StepContext {
    pub fn new(lr: f64, lb: f64, batch_size: usize, apply_bias: bool) -> StepContext {
        StepContext {
            lr,
            regularization: 1.0 - lb * lr / batch_size.max(1) as f64,
            apply_bias,
        }
    }
}

/// Optimizer bookkeeping for one training run.
///
/// Created at the start of `fit` with buffers shaped like the current
/// parameters and dropped when it returns.
#[derive(Debug, Clone)]
pub enum OptimizerState {
    Sgd,
    Momentum(MomentumState),
    Nag(MomentumState),
    Adam(AdamState),
    RmsProp(RmsPropState),
    Cf0910(Cf0910State),
}

impl OptimizerState {
    pub fn new(kind: OptimizerKind, weights: &[Matrix], bias: &[Matrix], epochs: usize) -> OptimizerState {
        match kind {
            OptimizerKind::Sgd => OptimizerState::Sgd,
            OptimizerKind::Momentum => OptimizerState::Momentum(MomentumState::new(weights, bias, epochs, false)),
            OptimizerKind::Nag => OptimizerState::Nag(MomentumState::new(weights, bias, epochs, true)),
            OptimizerKind::Adam => OptimizerState::Adam(AdamState::new(weights, bias)),
            OptimizerKind::RmsProp => OptimizerState::RmsProp(RmsPropState::new(weights, bias)),
            OptimizerKind::Cf0910 => OptimizerState::Cf0910(Cf0910State::new(weights, bias, epochs)),
        }
    }

    pub fn kind(&self) -> OptimizerKind {
        match self {
            OptimizerState::Sgd => OptimizerKind::Sgd,
            OptimizerState::Momentum(_) => OptimizerKind::Momentum,
            OptimizerState::Nag(_) => OptimizerKind::Nag,
            OptimizerState::Adam(_) => OptimizerKind::Adam,
            OptimizerState::RmsProp(_) => OptimizerKind::RmsProp,
            OptimizerState::Cf0910(_) => OptimizerKind::Cf0910,
        }
    }

    /// Advances epoch-dependent hyper-parameters. Called once at the start
    /// of every epoch.
    pub fn update_schedule(&mut self) {
        match self {
            OptimizerState::Momentum(state) | OptimizerState::Nag(state) => state.update_schedule(),
            OptimizerState::Cf0910(state) => state.update_schedule(),
            _ => {}
        }
    }

    /// Current momentum coefficient for the rules that have one.
    pub fn momentum(&self) -> Option<f64> {
        match self {
            OptimizerState::Momentum(state) | OptimizerState::Nag(state) => Some(state.momentum),
            OptimizerState::Cf0910(state) => Some(state.momentum),
            _ => None,
        }
    }

    /// All auxiliary buffers the rule keeps.
    pub fn buffers(&self) -> Vec<&Buffers> {
        match self {
            OptimizerState::Sgd => Vec::new(),
            OptimizerState::Momentum(state) | OptimizerState::Nag(state) => vec![&state.velocity],
            OptimizerState::Adam(state) => vec![&state.first_moment, &state.second_moment],
            OptimizerState::RmsProp(state) => vec![&state.cache],
            OptimizerState::Cf0910(state) => vec![&state.velocity],
        }
    }

    /// Updates parameter slot `i` in place.
    ///
    /// `activation` is the input the layer saw and `delta` its back-propagated
    /// error for the current batch.
    pub fn step(
        &mut self,
        i: usize,
        weight: &mut Matrix,
        bias: &mut Matrix,
        activation: &Matrix,
        delta: &Matrix,
        ctx: &StepContext,
    ) {
        let grad = Gradient::new(activation, delta);
        match self {
            OptimizerState::Sgd => Sgd::step(weight, bias, &grad, ctx),
            OptimizerState::Momentum(state) | OptimizerState::Nag(state) => state.step(i, weight, bias, &grad, ctx),
            OptimizerState::Adam(state) => state.step(i, weight, bias, &grad, ctx),
            OptimizerState::RmsProp(state) => state.step(i, weight, bias, &grad, ctx),
            OptimizerState::Cf0910(state) => state.step(i, weight, bias, &grad, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> (Vec<Matrix>, Vec<Matrix>) {
        (
            vec![Matrix::zeros(3, 4), Matrix::identity(4), Matrix::zeros(4, 2)],
            vec![Matrix::zeros(1, 4), Matrix::zeros(1, 4), Matrix::zeros(1, 2)],
        )
    }

    #[test]
    fn buffers_mirror_parameter_shapes() {
        let (weights, bias) = params();
        for kind in OptimizerKind::ALL {
            let state = OptimizerState::new(kind, &weights, &bias, 10);
            assert_eq!(state.kind(), kind);
            for buffers in state.buffers() {
                let shapes: Vec<_> = buffers.weights.iter().map(Matrix::shape).collect();
                assert_eq!(shapes, vec![(3, 4), (4, 4), (4, 2)]);
                let shapes: Vec<_> = buffers.bias.iter().map(Matrix::shape).collect();
                assert_eq!(shapes, vec![(1, 4), (1, 4), (1, 2)]);
            }
        }
    }

    #[test]
    fn sgd_step_decays_then_ascends() {
        let mut state = OptimizerState::new(OptimizerKind::Sgd, &[], &[], 1);
        let mut w = Matrix::from_data(vec![vec![1.0]]);
        let mut b = Matrix::zeros(1, 1);
        let a = Matrix::from_data(vec![vec![2.0], vec![1.0]]);
        let delta = Matrix::from_data(vec![vec![0.5], vec![1.0]]);
        let ctx = StepContext::new(0.1, 1.0, 2, true);
        state.step(0, &mut w, &mut b, &a, &delta, &ctx);

        // reg = 1 - 0.1/2; grad = 2·0.5 + 1·1 = 2; bias grad = 1.5
        assert!((w.data[0][0] - (0.95 + 0.2)).abs() < 1e-12);
        assert!((b.data[0][0] - 0.15).abs() < 1e-12);
    }

    #[test]
    fn bias_untouched_when_disabled() {
        let (weights, bias) = params();
        let ctx = StepContext::new(0.1, 0.0, 1, false);
        let a = Matrix::from_data(vec![vec![1.0; 4]]);
        let delta = Matrix::from_data(vec![vec![1.0; 4]]);
        for kind in OptimizerKind::ALL {
            let mut state = OptimizerState::new(kind, &weights, &bias, 10);
            state.update_schedule();
            let mut w = Matrix::identity(4);
            let mut b = Matrix::zeros(1, 4);
            state.step(1, &mut w, &mut b, &a, &delta, &ctx);
            assert_eq!(b, Matrix::zeros(1, 4), "{}", kind);
            assert_ne!(w, Matrix::identity(4), "{}", kind);
        }
    }

    #[test]
    fn rmsprop_first_step() {
        let w0 = vec![Matrix::zeros(1, 1)];
        let mut state = OptimizerState::new(OptimizerKind::RmsProp, &w0, &w0, 1);
        let mut w = Matrix::zeros(1, 1);
        let mut b = Matrix::zeros(1, 1);
        let one = Matrix::from_data(vec![vec![1.0]]);
        state.step(0, &mut w, &mut b, &one, &one, &StepContext::new(0.01, 0.0, 1, true));

        // c = 0.1: step = 0.01 / √0.1
        let expected = 0.01 / (0.1_f64 + 1e-8).sqrt();
        assert!((w.data[0][0] - expected).abs() < 1e-12);
        assert!((b.data[0][0] - expected).abs() < 1e-12);
    }

    #[test]
    fn schedules_only_move_momentum_rules() {
        for kind in OptimizerKind::ALL {
            let mut state = OptimizerState::new(kind, &[], &[], 4);
            state.update_schedule();
            state.update_schedule();
            match kind {
                OptimizerKind::Momentum | OptimizerKind::Nag | OptimizerKind::Cf0910 => {
                    assert!(state.momentum().unwrap() > 0.5)
                }
                _ => assert!(state.momentum().is_none()),
            }
        }
    }
}
