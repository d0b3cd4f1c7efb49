use crate::math::matrix::Matrix;
use crate::optim::state::{Buffers, Gradient, StepContext};

/// Velocity state shared by classic momentum and Nesterov (NAG).
///
/// The momentum coefficient climbs linearly from 0.5 towards 0.999 over the
/// run, re-derived once per epoch.
#[derive(Debug, Clone)]
pub struct MomentumState {
    pub velocity: Buffers,
    pub momentum: f64,
    step: f64,
    epoch: usize,
    look_ahead: bool,
}

impl MomentumState {
    pub fn new(weights: &[Matrix], bias: &[Matrix], epochs: usize, look_ahead: bool) -> MomentumState {
        MomentumState {
            velocity: Buffers::zeros_like(weights, bias),
            momentum: 0.5,
            step: 0.499 / epochs.max(1) as f64,
            epoch: 0,
            look_ahead,
        }
    }

    pub fn update_schedule(&mut self) {
        self.momentum = 0.5 + self.step * self.epoch as f64;
        self.epoch += 1;
    }

    /// Momentum: `v = m·v + lr·g; w += v`
    /// NAG:      `v = m·v + lr·g; w += m·v + lr·g`
    pub fn step(&mut self, i: usize, weight: &mut Matrix, bias: &mut Matrix, grad: &Gradient, ctx: &StepContext) {
        weight.scale(ctx.regularization);
        accelerate(&mut self.velocity.weights[i], weight, &grad.weight, self.momentum, ctx.lr, self.look_ahead);
        if ctx.apply_bias {
            accelerate(&mut self.velocity.bias[i], bias, &grad.bias, self.momentum, ctx.lr, self.look_ahead);
        }
    }
}

pub(crate) fn accelerate(velocity: &mut Matrix, param: &mut Matrix, grad: &Matrix, momentum: f64, lr: f64, look_ahead: bool) {
    velocity.scale(momentum);
    velocity.add_scaled(grad, lr);
    if look_ahead {
        param.add_scaled(velocity, momentum);
        param.add_scaled(grad, lr);
    } else {
        param.add_scaled(velocity, 1.0);
    }
}
