use crate::math::matrix::Matrix;
use crate::optim::momentum::accelerate;
use crate::optim::state::{Buffers, Gradient, StepContext};

/// Look-ahead momentum whose coefficient follows a parabola over the run:
/// `m(x) = 0.5 + a·x² + b·x`, 0.5 at both ends and 0.99 at the midpoint.
///
/// Only the weights carry a velocity; the bias takes a plain gradient step.
#[derive(Debug, Clone)]
pub struct Cf0910State {
    pub velocity: Buffers,
    pub momentum: f64,
    a: f64,
    b: f64,
    epoch: usize,
}

impl Cf0910State {
    pub fn new(weights: &[Matrix], bias: &[Matrix], epochs: usize) -> Cf0910State {
        let epochs = epochs.max(1) as f64;
        Cf0910State {
            velocity: Buffers::zeros_like(weights, bias),
            momentum: 0.5,
            a: -4.0 * 0.49 / (epochs * epochs),
            b: 4.0 * 0.49 / epochs,
            epoch: 0,
        }
    }

    pub fn update_schedule(&mut self) {
        let x = self.epoch as f64;
        self.momentum = 0.5 + self.a * x * x + self.b * x;
        self.epoch += 1;
    }

    pub fn step(&mut self, i: usize, weight: &mut Matrix, bias: &mut Matrix, grad: &Gradient, ctx: &StepContext) {
        weight.scale(ctx.regularization);
        accelerate(&mut self.velocity.weights[i], weight, &grad.weight, self.momentum, ctx.lr, true);
        if ctx.apply_bias {
            bias.add_scaled(&grad.bias, ctx.lr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficient_peaks_at_the_midpoint() {
        let w = vec![Matrix::zeros(1, 1)];
        let mut state = Cf0910State::new(&w, &w, 10);
        let mut seen = Vec::new();
        for _ in 0..=10 {
            state.update_schedule();
            seen.push(state.momentum);
        }
        assert!((seen[0] - 0.5).abs() < 1e-12);
        assert!((seen[5] - 0.99).abs() < 1e-12);
        assert!((seen[10] - 0.5).abs() < 1e-12);
        assert!(seen[..5].windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn bias_takes_a_plain_step() {
        let w = vec![Matrix::zeros(1, 2)];
        let b = vec![Matrix::zeros(1, 2)];
        let mut state = Cf0910State::new(&w, &b, 10);
        state.update_schedule();
        state.update_schedule();

        let mut weight = w[0].clone();
        let mut bias = Matrix::from_data(vec![vec![1.0, -1.0]]);
        let grad = Gradient {
            weight: Matrix::from_data(vec![vec![0.5, 0.5]]),
            bias: Matrix::from_data(vec![vec![2.0, 4.0]]),
        };
        let ctx = StepContext::new(0.1, 0.0, 1, true);
        for _ in 0..3 {
            state.step(0, &mut weight, &mut bias, &grad, &ctx);
        }

        assert!((bias.data[0][0] - 1.6).abs() < 1e-12);
        assert!((bias.data[0][1] - 0.2).abs() < 1e-12);
        assert_eq!(state.velocity.bias[0], Matrix::zeros(1, 2));
        assert!(weight.data[0][0] > 3.0 * 0.1 * 0.5);
    }
}
