use rand::Rng;
use rand::rngs::StdRng;

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::kind::{LayerKind, LayerShape};
use crate::loss::cost_kind::CostKind;
use crate::math::matrix::Matrix;

/// Whether a forward pass trains (dropout active) or predicts.
pub enum Pass<'a> {
    Predict,
    Train(&'a mut StdRng),
}

/// Output of one layer for one batch, plus the dropout mask it drew.
#[derive(Debug, Clone)]
pub struct LayerOutput {
    pub output: Matrix,
    pub mask: Option<Matrix>,
}

/// One link of the network chain.
///
/// Relations to other layers are indices into the owning network's layer
/// sequence; a layer never owns or outlives another one.
#[derive(Debug, Clone)]
pub struct Layer {
    kind: LayerKind,
    shape: LayerShape,
    /// Sub-layers only: the layer this one was appended after.
    parent: Option<usize>,
    /// Sub-layers only: the nearest root layer before this one.
    root: Option<usize>,
    /// Root layers only: the last sub-layer attached to this root.
    last_sub_layer: Option<usize>,
    /// Root layers only: a cost layer hangs off this root.
    is_last_root: bool,
}

impl Layer {
    pub fn root(activation: ActivationFunction, shape: LayerShape) -> Layer {
        Layer::with_kind(LayerKind::Root(activation), shape)
    }

    /// Root layer with explicit `(input, output)` widths.
    pub fn dense(activation: ActivationFunction, input: usize, output: usize) -> Layer {
        Layer::root(activation, LayerShape::Full(input, output))
    }

    /// Root layer whose input width is taken from the graph.
    pub fn stacked(activation: ActivationFunction, output: usize) -> Layer {
        Layer::root(activation, LayerShape::Output(output))
    }

    /// Dropout keeping each unit with probability `keep_prob` ∈ (0, 1].
    pub fn dropout(keep_prob: f64) -> Result<Layer> {
        if !(keep_prob.is_finite() && keep_prob > 0.0 && keep_prob <= 1.0) {
            return Err(NetworkError::InvalidParameter(format!(
                "Dropout keep probability must be in (0, 1], {} found", keep_prob
            )));
        }
        Ok(Layer::with_kind(LayerKind::Dropout { keep_prob }, LayerShape::Inherit))
    }

    pub fn cost(cost: CostKind) -> Layer {
        Layer::with_kind(LayerKind::Cost(cost), LayerShape::Inherit)
    }

    /// Overrides the declared shape, e.g. to give a sub-layer explicit widths.
    pub fn with_shape(mut self, shape: LayerShape) -> Layer {
        self.shape = shape;
        self
    }

    fn with_kind(kind: LayerKind, shape: LayerShape) -> Layer {
        Layer {
            kind,
            shape,
            parent: None,
            root: None,
            last_sub_layer: None,
            is_last_root: false,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn shape(&self) -> LayerShape {
        self.shape
    }

    /// Resolved `(input, output)` widths. `None` until the layer joins a graph
    /// (or when declared with a partial shape).
    pub fn dims(&self) -> Option<(usize, usize)> {
        match self.shape {
            LayerShape::Full(input, output) => Some((input, output)),
            _ => None,
        }
    }

    pub fn activation(&self) -> Option<ActivationFunction> {
        match self.kind {
            LayerKind::Root(act) => Some(act),
            _ => None,
        }
    }

    pub fn is_sub_layer(&self) -> bool {
        self.kind.is_sub_layer()
    }

    pub fn is_cost(&self) -> bool {
        self.kind.is_cost()
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn root_index(&self) -> Option<usize> {
        self.root
    }

    pub fn last_sub_layer(&self) -> Option<usize> {
        self.last_sub_layer
    }

    pub fn is_last_root(&self) -> bool {
        self.is_last_root
    }

    /// Extra text shown next to sub-layers in structure summaries.
    pub fn description(&self) -> String {
        match self.kind {
            LayerKind::Dropout { keep_prob } => format!("(Keep prob: {})", keep_prob),
            _ => String::new(),
        }
    }

    pub(crate) fn attach(&mut self, dims: (usize, usize), parent: Option<usize>, root: Option<usize>) {
        self.shape = LayerShape::Full(dims.0, dims.1);
        self.parent = parent;
        self.root = root;
    }

    pub(crate) fn register_sub_layer(&mut self, index: usize, is_cost: bool) {
        self.last_sub_layer = Some(index);
        if is_cost {
            self.is_last_root = true;
        }
    }

    /// Forward computation for one batch.
    ///
    /// - Root:    f(input · weight + bias)
    /// - Dropout: input ⊙ mask while training, input unchanged when predicting
    /// - Cost:    input unchanged
    pub fn activate(&self, input: &Matrix, weight: &Matrix, bias: &Matrix, pass: Pass<'_>) -> LayerOutput {
        match self.kind {
            LayerKind::Root(act) => LayerOutput {
                output: act.apply(&input.dot(weight).add_row(bias)),
                mask: None,
            },
            LayerKind::Dropout { keep_prob } => match pass {
                Pass::Predict => LayerOutput { output: input.clone(), mask: None },
                Pass::Train(rng) => {
                    let mask = dropout_mask(input.rows, input.cols, keep_prob, rng);
                    LayerOutput { output: input.hadamard(&mask), mask: Some(mask) }
                }
            },
            LayerKind::Cost(_) => LayerOutput { output: input.clone(), mask: None },
        }
    }

    /// Delta of this layer given the delta and weight of the layer after it.
    ///
    /// `activation` is this layer's own forward output. A terminal root skips
    /// its derivative because the cost layer's seed already contains it.
    pub fn bp(&self, activation: &Matrix, next_weight: &Matrix, next_delta: &Matrix, mask: Option<&Matrix>) -> Matrix {
        match self.kind {
            LayerKind::Root(act) => {
                let back = next_delta.dot_t(next_weight);
                if self.is_last_root {
                    back
                } else {
                    back.hadamard(&act.derivative_matrix(activation))
                }
            }
            LayerKind::Dropout { .. } => {
                let back = next_delta.dot_t(next_weight);
                match mask {
                    Some(mask) => back.hadamard(mask),
                    None => back,
                }
            }
            LayerKind::Cost(_) => next_delta.clone(),
        }
    }

    /// Seed delta of a cost layer; `None` for every other kind.
    ///
    /// `root_output` is the terminal root's forward output.
    pub fn bp_first(
        &self,
        root: ActivationFunction,
        root_output: &Matrix,
        target: &Matrix,
        prediction: &Matrix,
    ) -> Option<Matrix> {
        match self.kind {
            LayerKind::Cost(cost) => Some(cost.bp_first(root, root_output, target, prediction)),
            _ => None,
        }
    }

    /// Summed batch cost of a cost layer; `None` for every other kind.
    pub fn calculate(&self, target: &Matrix, prediction: &Matrix) -> Option<f64> {
        match self.kind {
            LayerKind::Cost(cost) => Some(cost.calculate(target, prediction)),
            _ => None,
        }
    }
}

/// Pre-scaled binary mask: `1/p` with probability `p`, else `0`.
fn dropout_mask(rows: usize, cols: usize, keep_prob: f64, rng: &mut StdRng) -> Matrix {
    let scale = 1.0 / keep_prob;
    let data = (0..rows)
        .map(|_| (0..cols)
            .map(|_| if rng.gen::<f64>() < keep_prob { scale } else { 0.0 })
            .collect())
        .collect();
    Matrix { rows, cols, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn batch() -> Matrix {
        Matrix::from_data(vec![vec![0.5, -1.0, 2.0, 3.0]; 8])
    }

    #[test]
    fn dropout_predict_pass_is_identity() {
        let layer = Layer::dropout(0.3).unwrap();
        let x = batch();
        let out = layer.activate(&x, &Matrix::identity(4), &Matrix::zeros(1, 4), Pass::Predict);
        assert_eq!(out.output, x);
        assert!(out.mask.is_none());
    }

    #[test]
    fn dropout_train_pass_zeroes_or_rescales() {
        let layer = Layer::dropout(0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let x = batch();
        let out = layer.activate(&x, &Matrix::identity(4), &Matrix::zeros(1, 4), Pass::Train(&mut rng));
        for (row_in, row_out) in x.data.iter().zip(out.output.data.iter()) {
            for (a, b) in row_in.iter().zip(row_out.iter()) {
                assert!(*b == 0.0 || (*b - 2.0 * a).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn dropout_masks_are_drawn_per_call() {
        let layer = Layer::dropout(0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let x = Matrix::from_data(vec![vec![1.0; 32]; 4]);
        let w = Matrix::identity(32);
        let b = Matrix::zeros(1, 32);
        let first = layer.activate(&x, &w, &b, Pass::Train(&mut rng)).mask;
        let second = layer.activate(&x, &w, &b, Pass::Train(&mut rng)).mask;
        assert_ne!(first, second);
    }

    #[test]
    fn dropout_backward_reuses_forward_mask() {
        let layer = Layer::dropout(0.5).unwrap();
        let mask = Matrix::from_data(vec![vec![2.0, 0.0]]);
        let delta = Matrix::from_data(vec![vec![1.0, 1.0]]);
        let back = layer.bp(&delta, &Matrix::identity(2), &delta, Some(&mask));
        assert_eq!(back, mask);
    }

    #[test]
    fn dropout_rejects_out_of_range_probabilities() {
        for p in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(Layer::dropout(p), Err(NetworkError::InvalidParameter(_))));
        }
        assert!(Layer::dropout(1.0).is_ok());
    }

    #[test]
    fn root_backward_applies_own_derivative_unless_terminal() {
        let mut layer = Layer::dense(ActivationFunction::Sigmoid, 2, 2);
        let out = Matrix::from_data(vec![vec![0.5, 0.5]]);
        let delta = Matrix::from_data(vec![vec![1.0, -1.0]]);
        let eye = Matrix::identity(2);
        assert_eq!(layer.bp(&out, &eye, &delta, None).data[0], vec![0.25, -0.25]);

        layer.register_sub_layer(1, true);
        assert_eq!(layer.bp(&out, &eye, &delta, None), delta);
    }

    #[test]
    fn only_cost_layers_calculate() {
        let y = Matrix::from_data(vec![vec![1.0]]);
        assert!(Layer::dense(ActivationFunction::Identity, 1, 1).calculate(&y, &y).is_none());
        assert_eq!(Layer::cost(CostKind::Mse).calculate(&y, &y), Some(0.0));
    }
}
