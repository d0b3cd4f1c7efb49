use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::state::{OptimizerState, StepContext};

/// One mini-batch update: forward with dropout, backward through every
/// layer, then one optimizer step per root layer from last to first.
///
/// Closes the graph with its default cost layer if it is still open.
/// Returns the mean training-mode cost of the batch, measured before the
/// update.
pub fn train_step(
    network: &mut Network,
    state: &mut OptimizerState,
    x: &Matrix,
    y: &Matrix,
    ctx: &StepContext,
) -> Result<f64> {
    network.check_input(x)?;
    let cost = network.add_cost_layer()?;
    network.check_labels(x, y)?;
    if x.is_empty() {
        return Err(NetworkError::InvalidData("empty batch".into()));
    }

    let trace = network.trace_train(x);
    let prediction = trace.output();
    let n = network.layers.len();

    let root_idx = network.layers.iter()
        .rposition(|layer| !layer.is_sub_layer())
        .ok_or(NetworkError::EmptyGraph)?;
    let root = network.layers[root_idx].activation().ok_or(NetworkError::EmptyGraph)?;
    let loss = cost.calculate(y, prediction) / x.rows as f64;

    // Every delta is computed before any parameter moves.
    let mut deltas = vec![Matrix::default(); n];
    deltas[n - 1] = cost.bp_first(root, &trace.activations[root_idx], y, prediction);
    for k in (0..n - 1).rev() {
        deltas[k] = network.layers[k].bp(
            &trace.activations[k],
            &network.weights[k + 1],
            &deltas[k + 1],
            trace.masks[k].as_ref(),
        );
    }

    let Network { layers, weights, bias, .. } = network;
    for k in (0..n).rev().filter(|&k| !layers[k].is_sub_layer()) {
        let input = if k == 0 { x } else { &trace.activations[k - 1] };
        state.step(k, &mut weights[k], &mut bias[k], input, &deltas[k], ctx);
    }

    Ok(loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::layer::Layer;
    use crate::optim::kind::OptimizerKind;

    fn toy() -> (Matrix, Matrix) {
        let x = Matrix::from_data(vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 0.0]]);
        // Class 1 iff the first feature is set.
        let y = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0, 0.0]]);
        (x, y)
    }

    #[test]
    fn sub_layers_keep_their_identity_weights() {
        let mut net = Network::new();
        net.add(Layer::dense(ActivationFunction::Tanh, 2, 6)).unwrap();
        net.add_named("Dropout", Some("0.5")).unwrap();
        net.add_named("Softmax", Some("2")).unwrap();

        let (x, y) = toy();
        let mut state = OptimizerState::new(OptimizerKind::Adam, net.weights(), net.bias(), 1);
        let ctx = StepContext::new(0.05, 0.01, 4, true);
        let before: Vec<Matrix> = net.weights().to_vec();
        train_step(&mut net, &mut state, &x, &y, &ctx).unwrap();

        assert!(net.is_closed());
        assert_ne!(net.weights()[0], before[0]);
        assert_eq!(net.weights()[1], Matrix::identity(6));
        assert_ne!(net.weights()[2], before[2]);
    }

    #[test]
    fn repeated_sgd_steps_reduce_the_batch_loss() {
        let mut net = Network::new();
        net.add(Layer::dense(ActivationFunction::Sigmoid, 2, 2)).unwrap();
        let (x, y) = toy();
        let mut state = OptimizerState::new(OptimizerKind::Sgd, net.weights(), net.bias(), 1);
        let ctx = StepContext::new(0.5, 0.0, 4, true);

        // Convex single-layer problem; the step is below 2/L.
        let first = train_step(&mut net, &mut state, &x, &y, &ctx).unwrap();
        let mut last = first;
        for _ in 0..50 {
            last = train_step(&mut net, &mut state, &x, &y, &ctx).unwrap();
        }
        assert!(last < first, "{} !< {}", last, first);
    }

    #[test]
    fn label_width_is_checked() {
        let mut net = Network::new();
        net.add(Layer::dense(ActivationFunction::Sigmoid, 2, 3)).unwrap();
        let (x, y) = toy();
        let mut state = OptimizerState::new(OptimizerKind::Sgd, net.weights(), net.bias(), 1);
        let ctx = StepContext::new(0.1, 0.0, 4, true);
        assert!(matches!(
            train_step(&mut net, &mut state, &x, &y, &ctx),
            Err(NetworkError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn dropout_before_an_unmatched_cost_follows_the_numeric_gradient() {
        let mut net = Network::new();
        net.add(Layer::dense(ActivationFunction::Tanh, 1, 1)).unwrap();
        net.add_named("Dropout", Some("0.5")).unwrap();
        net.add_named("MSE", None).unwrap();

        // Find a seed whose mask keeps the single unit.
        let x = Matrix::from_data(vec![vec![0.8]]);
        let y = Matrix::from_data(vec![vec![0.9]]);
        let (w, mask) = loop {
            let mut replay = net.clone();
            let trace = replay.trace_train(&x);
            let mask = trace.masks[1].as_ref().map(|m| m.data[0][0]).unwrap();
            if mask > 0.0 {
                break (net.weights()[0].data[0][0], mask);
            }
            net.trace_train(&x);
        };

        // Loss as a function of the single weight with that mask fixed.
        let loss = |w: f64| {
            let p = mask * (w * x.data[0][0]).tanh();
            0.5 * (y.data[0][0] - p).powi(2)
        };
        let h = 1e-6;
        let numeric = (loss(w + h) - loss(w - h)) / (2.0 * h);

        let lr = 1e-6;
        let mut state = OptimizerState::new(OptimizerKind::Sgd, net.weights(), net.bias(), 1);
        let ctx = StepContext::new(lr, 0.0, 1, false);
        train_step(&mut net, &mut state, &x, &y, &ctx).unwrap();

        // SGD adds lr times the descent direction, the negated gradient.
        let applied = -(net.weights()[0].data[0][0] - w) / lr;
        assert!((applied - numeric).abs() < 1e-4, "{} vs {}", applied, numeric);
    }
}
