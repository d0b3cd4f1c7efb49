//! Trains a layer graph on the XOR problem and prints its predictions.
//!
//! Usage: cargo run -- --widths 2,4,2 --optimizer Adam --epochs 500

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ferrite_chain::{BuildSpec, Matrix, Network, OptimizerKind, TrainConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Train a ferrite-chain network on XOR")]
struct Args {
    /// Layer widths for the quick-build, input first
    #[arg(long, value_delimiter = ',', default_value = "2,4,2")]
    widths: Vec<usize>,

    /// Optimizer: SGD, Momentum, NAG, Adam, RMSProp or CF0910
    #[arg(long, default_value = "RMSProp")]
    optimizer: OptimizerKind,

    #[arg(long, default_value_t = 500)]
    epochs: usize,

    #[arg(long, default_value_t = 4)]
    batch_size: usize,

    /// Learning rate
    #[arg(long, default_value_t = 0.05)]
    lr: f64,

    /// L2 regularization strength
    #[arg(long, default_value_t = 0.01)]
    lb: f64,

    #[arg(long, default_value_t = ferrite_chain::network::DEFAULT_SEED)]
    seed: u64,

    /// Epochs between progress reports
    #[arg(long, default_value_t = 100)]
    record_period: usize,

    /// Write the trained graph to this JSON file
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let x = Matrix::from_data(vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ]);
    let y = Matrix::from_data(vec![
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
    ]);

    let mut network = Network::with_seed(args.seed);
    network.build(BuildSpec::Widths(args.widths.clone()))
        .context("invalid --widths")?;
    println!("{}", network);

    let config = TrainConfig {
        record_period: args.record_period,
        lr: args.lr,
        lb: args.lb,
        do_log: true,
        ..TrainConfig::new(args.epochs, args.batch_size, Some(args.optimizer))
    }
    .train_only();
    let logs = network.fit(&x, &y, &config)?;

    if let Some(loss) = logs.train_loss.last() {
        println!("final train loss = {:.6}", loss);
    }
    for (row, class) in x.data.iter().zip(network.predict_classes(&x)?) {
        println!("Input: {:?} -> class {}", row, class);
    }
    let accuracy = network.evaluate_named(&x, &y, &["acc"])?[0];
    println!("accuracy = {:.2}", accuracy);

    if let Some(path) = args.save {
        network.save_json(&path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        println!("saved to {}", path.display());
    }
    Ok(())
}
