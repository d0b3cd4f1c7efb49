use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};
use crate::layers::kind::{LayerKind, LayerShape};
use crate::layers::layer::{Layer, Pass};
use crate::layers::registry;
use crate::loss::cost_kind::CostKind;
use crate::math::matrix::Matrix;
use crate::metrics::Metric;
use crate::network::spec::{BuildSpec, LayerSpec};
use crate::optim::kind::OptimizerKind;
use crate::train::logs::FitLogs;

/// Seed used by [`Network::new`].
pub const DEFAULT_SEED: u64 = 142857;

/// A chain of layers with one weight/bias pair per layer.
///
/// Sub-layers carry an identity weight and a zero bias so that
/// `layers`, `weights`, `bias` and `layer_params` always share one index.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) layers: Vec<Layer>,
    pub(crate) weights: Vec<Matrix>,
    pub(crate) bias: Vec<Matrix>,
    pub(crate) layer_params: Vec<Option<f64>>,
    pub(crate) current_dimension: usize,
    pub(crate) optimizer: Option<OptimizerKind>,
    pub(crate) logs: Option<FitLogs>,
    pub(crate) rng: StdRng,
    seed: u64,
}

/// Read-only view of one layer and its parameters.
#[derive(Debug, Clone, Copy)]
pub struct LayerView<'a> {
    pub name: &'static str,
    pub layer: &'a Layer,
    pub weight: &'a Matrix,
    pub bias: &'a Matrix,
}

/// Every layer's output for one batch, plus the dropout masks drawn.
#[derive(Debug, Clone)]
pub struct ForwardTrace {
    pub activations: Vec<Matrix>,
    pub masks: Vec<Option<Matrix>>,
}

impl ForwardTrace {
    pub fn output(&self) -> &Matrix {
        &self.activations[self.activations.len() - 1]
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::new()
    }
}

impl Network {
    pub fn new() -> Network {
        Network::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Network {
        Network::from_rng(StdRng::seed_from_u64(seed), seed)
    }

    fn from_rng(rng: StdRng, seed: u64) -> Network {
        Network {
            layers: Vec::new(),
            weights: Vec::new(),
            bias: Vec::new(),
            layer_params: Vec::new(),
            current_dimension: 0,
            optimizer: None,
            logs: None,
            rng,
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Drops every layer, parameter, optimizer choice and log. The random
    /// generator keeps its current state.
    pub fn reset(&mut self) {
        let rng = self.rng.clone();
        *self = Network::from_rng(rng, self.seed);
    }

    // ── Assembly ──────────────────────────────────────────────────────────

    /// Appends a layer, resolving its shape against the current width.
    pub fn add(&mut self, mut layer: Layer) -> Result<()> {
        if self.is_closed() {
            return Err(NetworkError::GraphClosed { layer: layer.name().to_owned() });
        }

        let dims = self.resolve_dims(&layer)?;
        let index = self.layers.len();

        if layer.is_sub_layer() {
            let root = self.layers.iter().rposition(|l| !l.is_sub_layer());
            layer.attach(dims, Some(index - 1), root);
            if let Some(root) = root {
                self.layers[root].register_sub_layer(index, layer.is_cost());
            }
            self.weights.push(Matrix::identity(dims.1));
        } else {
            layer.attach(dims, None, None);
            self.weights.push(Matrix::random(dims.0, dims.1, &mut self.rng));
        }
        self.bias.push(Matrix::zeros(1, dims.1));
        self.layer_params.push(layer.kind().param());
        self.current_dimension = dims.1;

        debug!(index, layer = layer.name(), input = dims.0, output = dims.1, "layer added");
        self.layers.push(layer);
        Ok(())
    }

    /// Appends a layer by registry name. `param` is the output width for root
    /// layers and the keep probability for `Dropout`.
    pub fn add_named(&mut self, name: &str, param: Option<&str>) -> Result<()> {
        if self.is_closed() {
            return Err(NetworkError::GraphClosed { layer: name.to_owned() });
        }
        self.add(registry::resolve(name, param)?)
    }

    fn resolve_dims(&self, layer: &Layer) -> Result<(usize, usize)> {
        let width = self.current_dimension;
        let dims = if self.layers.is_empty() {
            match (layer.is_sub_layer(), layer.shape()) {
                (false, LayerShape::Full(input, output)) => (input, output),
                _ => {
                    return Err(NetworkError::ShapeMismatch(format!(
                        "first layer must be a root layer with an (input, output) shape, '{}' {:?} found",
                        layer.name(), layer.shape()
                    )))
                }
            }
        } else if layer.is_sub_layer() {
            let fits = match layer.shape() {
                _ if layer.is_cost() => true,
                LayerShape::Full(input, output) => input == width && output == width,
                LayerShape::Output(output) => output == width,
                LayerShape::Inherit => true,
            };
            if !fits {
                return Err(NetworkError::ShapeMismatch(format!(
                    "'{}' must keep the current width {}, {:?} found",
                    layer.name(), width, layer.shape()
                )));
            }
            (width, width)
        } else {
            match layer.shape() {
                LayerShape::Full(input, output) if input == width => (input, output),
                LayerShape::Full(input, _) => {
                    return Err(NetworkError::ShapeMismatch(format!(
                        "'{}' expects input width {}, current width is {}",
                        layer.name(), input, width
                    )))
                }
                LayerShape::Output(output) => (width, output),
                LayerShape::Inherit => {
                    return Err(NetworkError::ShapeMismatch(format!(
                        "root layer '{}' needs an output width", layer.name()
                    )))
                }
            }
        };
        if dims.0 == 0 || dims.1 == 0 {
            return Err(NetworkError::InvalidParameter(format!(
                "'{}' has a zero width: {:?}", layer.name(), dims
            )));
        }
        Ok(dims)
    }

    /// Closes the graph with the cost layer matching its terminal root,
    /// unless a cost layer is already present. Returns the graph's cost.
    pub fn add_cost_layer(&mut self) -> Result<CostKind> {
        if let Some(cost) = self.cost() {
            return Ok(cost);
        }
        let root = self.terminal_root().ok_or(NetworkError::EmptyGraph)?;
        let cost = CostKind::for_root(root);
        self.add(Layer::cost(cost))?;
        debug!(cost = cost.name(), "cost layer added");
        Ok(cost)
    }

    /// Alias of [`Network::add_cost_layer`].
    pub fn finalize(&mut self) -> Result<CostKind> {
        self.add_cost_layer()
    }

    /// Replaces the whole graph. On failure `self` is left as it was.
    pub fn build(&mut self, spec: BuildSpec) -> Result<()> {
        let mut staged = Network::from_rng(self.rng.clone(), self.seed);
        match spec {
            BuildSpec::Layers(specs) => {
                for spec in &specs {
                    staged.add(spec.to_layer()?)?;
                }
            }
            BuildSpec::Widths(widths) => {
                if widths.len() < 2 || widths.contains(&0) {
                    return Err(NetworkError::InvalidParameter(format!(
                        "quick-build needs at least two non-zero widths, {:?} found", widths
                    )));
                }
                for pair in widths.windows(2) {
                    staged.add(Layer::dense(ActivationFunction::Sigmoid, pair[0], pair[1]))?;
                }
                staged.add_cost_layer()?;
            }
        }
        *self = staged;
        Ok(())
    }

    /// Picks the optimizer by registry name for the next `fit`.
    pub fn set_optimizer(&mut self, name: &str) -> Result<()> {
        self.optimizer = Some(name.parse()?);
        Ok(())
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// A cost layer has been appended; no further layer is accepted.
    pub fn is_closed(&self) -> bool {
        self.layers.last().is_some_and(Layer::is_cost)
    }

    pub fn current_dimension(&self) -> usize {
        self.current_dimension
    }

    pub fn input_dim(&self) -> Option<usize> {
        self.layers.first().and_then(Layer::dims).map(|(input, _)| input)
    }

    pub fn optimizer(&self) -> Option<OptimizerKind> {
        self.optimizer
    }

    /// Logs of the last `fit`, or those restored by `load_json`.
    pub fn logs(&self) -> Option<&FitLogs> {
        self.logs.as_ref()
    }

    pub fn cost(&self) -> Option<CostKind> {
        match self.layers.last()?.kind() {
            LayerKind::Cost(cost) => Some(cost),
            _ => None,
        }
    }

    fn terminal_root(&self) -> Option<ActivationFunction> {
        self.layers.iter().rev().find_map(Layer::activation)
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(Layer::name).collect()
    }

    pub fn layer_shapes(&self) -> Vec<(usize, usize)> {
        self.layers.iter().map(|l| l.dims().unwrap_or_default()).collect()
    }

    pub fn layer_params(&self) -> &[Option<f64>] {
        &self.layer_params
    }

    /// `(name, shape, param)` triples that rebuild this exact structure.
    pub fn layer_specs(&self) -> Vec<LayerSpec> {
        self.layers.iter().zip(&self.layer_params)
            .map(|(layer, &param)| LayerSpec {
                name: layer.name().to_owned(),
                shape: layer.dims().unwrap_or_default(),
                param,
            })
            .collect()
    }

    pub fn layer(&self, i: usize) -> Option<LayerView<'_>> {
        let layer = self.layers.get(i)?;
        Some(LayerView {
            name: layer.name(),
            layer,
            weight: &self.weights[i],
            bias: &self.bias[i],
        })
    }

    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    pub fn bias(&self) -> &[Matrix] {
        &self.bias
    }

    // ── Forward ───────────────────────────────────────────────────────────

    /// Training-mode forward pass: dropout draws fresh masks from the graph's
    /// generator.
    pub(crate) fn trace_train(&mut self, x: &Matrix) -> ForwardTrace {
        let Network { layers, weights, bias, rng, .. } = self;
        forward(layers, weights, bias, x, Some(rng))
    }

    pub(crate) fn trace_predict(&self, x: &Matrix) -> ForwardTrace {
        forward(&self.layers, &self.weights, &self.bias, x, None)
    }

    pub(crate) fn check_input(&self, x: &Matrix) -> Result<()> {
        let input = self.input_dim().ok_or(NetworkError::EmptyGraph)?;
        if x.cols != input {
            return Err(NetworkError::ShapeMismatch(format!(
                "input width should be {}, {} found", input, x.cols
            )));
        }
        Ok(())
    }

    pub(crate) fn check_labels(&self, x: &Matrix, y: &Matrix) -> Result<()> {
        if x.rows != y.rows {
            return Err(NetworkError::InvalidData(format!(
                "{} feature rows but {} label rows", x.rows, y.rows
            )));
        }
        if y.cols != self.current_dimension {
            return Err(NetworkError::ShapeMismatch(format!(
                "output layer's width should be {}, {} found", self.current_dimension, y.cols
            )));
        }
        Ok(())
    }

    // ── Inference ─────────────────────────────────────────────────────────

    /// Forward pass with dropout disabled.
    pub fn predict(&self, x: &Matrix) -> Result<Matrix> {
        self.check_input(x)?;
        let mut trace = self.trace_predict(x);
        Ok(trace.activations.pop().unwrap_or_default())
    }

    pub fn predict_one(&self, x: &[f64]) -> Result<Vec<f64>> {
        let out = self.predict(&Matrix::from_data(vec![x.to_vec()]))?;
        Ok(out.data.into_iter().next().unwrap_or_default())
    }

    /// Row-wise argmax of the network output.
    pub fn predict_classes(&self, x: &Matrix) -> Result<Vec<usize>> {
        Ok(self.predict(x)?.argmax_rows())
    }

    pub fn evaluate(&self, x: &Matrix, y: &Matrix, metrics: &[Metric]) -> Result<Vec<f64>> {
        self.check_input(x)?;
        self.check_labels(x, y)?;
        let y_pred = self.predict(x)?;
        Ok(metrics.iter().map(|m| m.evaluate(y, &y_pred)).collect())
    }

    pub fn evaluate_named(&self, x: &Matrix, y: &Matrix, names: &[&str]) -> Result<Vec<f64>> {
        let metrics = names.iter()
            .map(|name| name.parse::<Metric>())
            .collect::<Result<Vec<_>>>()?;
        self.evaluate(x, y, &metrics)
    }

    /// Mean cost of `(x, y)` in predict mode. Zero for an empty set or a
    /// graph without a cost layer.
    pub(crate) fn mean_cost(&self, x: &Matrix, y: &Matrix) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let prediction = self.trace_predict(x);
        match self.cost() {
            Some(cost) => cost.calculate(y, prediction.output()) / x.rows as f64,
            None => 0.0,
        }
    }
}

/// Runs `x` through every layer, collecting outputs and dropout masks.
pub(crate) fn forward(
    layers: &[Layer],
    weights: &[Matrix],
    bias: &[Matrix],
    x: &Matrix,
    mut rng: Option<&mut StdRng>,
) -> ForwardTrace {
    let mut activations: Vec<Matrix> = Vec::with_capacity(layers.len());
    let mut masks = Vec::with_capacity(layers.len());
    for (i, layer) in layers.iter().enumerate() {
        let input = if i == 0 { x } else { &activations[i - 1] };
        let pass = match rng.as_deref_mut() {
            Some(rng) => Pass::Train(rng),
            None => Pass::Predict,
        };
        let out = layer.activate(input, &weights[i], &bias[i], pass);
        activations.push(out.output);
        masks.push(out.mask);
    }
    ForwardTrace { activations, masks }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(30))?;
        writeln!(f, "Structure")?;
        writeln!(f, "{}", "-".repeat(30))?;
        match self.input_dim() {
            None => writeln!(f, "None")?,
            Some(input) => {
                writeln!(f, "Input  :  {:<10} - {}", "Dimension", input)?;
                for layer in self.layers.iter().filter(|l| !l.is_cost()) {
                    let width = layer.dims().map_or(0, |(_, out)| out);
                    if layer.is_sub_layer() {
                        writeln!(f, "Layer  :  {:<10} - {} {}", layer.name(), width, layer.description())?;
                    } else {
                        writeln!(f, "Layer  :  {:<10} - {}", layer.name(), width)?;
                    }
                }
                match self.cost() {
                    Some(cost) => writeln!(f, "Cost   :  {}", cost)?,
                    None => writeln!(f, "Cost   :  (none yet)")?,
                }
            }
        }
        write!(f, "{}", "-".repeat(30))
    }
}
