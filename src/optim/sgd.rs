use crate::math::matrix::Matrix;
use crate::optim::state::{Gradient, StepContext};

/// Plain stochastic gradient descent; carries no state.
pub struct Sgd;

impl Sgd {
    /// `w = reg·w + lr·g`, `b += lr·gb`
    pub fn step(weight: &mut Matrix, bias: &mut Matrix, grad: &Gradient, ctx: &StepContext) {
        weight.scale(ctx.regularization);
        weight.add_scaled(&grad.weight, ctx.lr);
        if ctx.apply_bias {
            bias.add_scaled(&grad.bias, ctx.lr);
        }
    }
}
