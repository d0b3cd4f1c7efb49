use crate::math::matrix::Matrix;
use crate::optim::state::{Buffers, Gradient, StepContext};

/// RMSProp: `c = d·c + (1-d)·g²; w += lr·g/√(c+ε)`
#[derive(Debug, Clone)]
pub struct RmsPropState {
    pub cache: Buffers,
    pub decay: f64,
    pub eps: f64,
}

impl RmsPropState {
    pub fn new(weights: &[Matrix], bias: &[Matrix]) -> RmsPropState {
        RmsPropState {
            cache: Buffers::zeros_like(weights, bias),
            decay: 0.9,
            eps: 1e-8,
        }
    }

    pub fn step(&mut self, i: usize, weight: &mut Matrix, bias: &mut Matrix, grad: &Gradient, ctx: &StepContext) {
        weight.scale(ctx.regularization);
        rms_update(&mut self.cache.weights[i], weight, &grad.weight, self.decay, self.eps, ctx.lr);
        if ctx.apply_bias {
            rms_update(&mut self.cache.bias[i], bias, &grad.bias, self.decay, self.eps, ctx.lr);
        }
    }
}

fn rms_update(cache: &mut Matrix, param: &mut Matrix, g: &Matrix, decay: f64, eps: f64, lr: f64) {
    cache.scale(decay);
    cache.add_scaled(&g.map(|x| x * x), 1.0 - decay);
    param.add_scaled(&g.zip_map(cache, |g, c| g / (c + eps).sqrt()), lr);
}
