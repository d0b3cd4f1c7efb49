use crate::math::matrix::Matrix;
use crate::optim::state::{Buffers, Gradient, StepContext};

/// Adam without bias correction: the moment estimates are used as they are,
/// never divided by `1 - βᵗ`.
#[derive(Debug, Clone)]
pub struct AdamState {
    pub first_moment: Buffers,
    pub second_moment: Buffers,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
}

impl AdamState {
    pub fn new(weights: &[Matrix], bias: &[Matrix]) -> AdamState {
        AdamState {
            first_moment: Buffers::zeros_like(weights, bias),
            second_moment: Buffers::zeros_like(weights, bias),
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }

    pub fn step(&mut self, i: usize, weight: &mut Matrix, bias: &mut Matrix, grad: &Gradient, ctx: &StepContext) {
        weight.scale(ctx.regularization);
        let (b1, b2, eps) = (self.beta1, self.beta2, self.eps);
        adam_update(&mut self.first_moment.weights[i], &mut self.second_moment.weights[i], weight, &grad.weight, b1, b2, eps, ctx.lr);
        if ctx.apply_bias {
            adam_update(&mut self.first_moment.bias[i], &mut self.second_moment.bias[i], bias, &grad.bias, b1, b2, eps, ctx.lr);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn adam_update(m: &mut Matrix, v: &mut Matrix, param: &mut Matrix, g: &Matrix, beta1: f64, beta2: f64, eps: f64, lr: f64) {
    m.scale(beta1);
    m.add_scaled(g, 1.0 - beta1);
    v.scale(beta2);
    v.add_scaled(&g.map(|x| x * x), 1.0 - beta2);
    param.add_scaled(&m.zip_map(v, |m, v| m / (v + eps).sqrt()), lr);
}
