use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::Rng;
use tracing::{info, warn};

use crate::data::split::{split_data, Partition};
use crate::error::{NetworkError, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::state::{OptimizerState, StepContext};
use crate::train::epoch_stats::EpochStats;
use crate::train::logs::FitLogs;
use crate::train::step::train_step;
use crate::train::train_config::TrainConfig;

impl Network {
    /// Trains the graph on `(x, y)` and returns the logs of the run.
    ///
    /// The graph is closed with its default cost layer first. Everything is
    /// validated before the first epoch, so a rejected call leaves the
    /// parameters untouched.
    ///
    /// # Early termination
    /// The loop stops before the next epoch if:
    /// - `config.stop_flag` is set, **or**
    /// - the `progress_tx` receiver has been dropped.
    pub fn fit(&mut self, x: &Matrix, y: &Matrix, config: &TrainConfig) -> Result<FitLogs> {
        if x.rows != y.rows || x.is_empty() {
            return Err(NetworkError::InvalidData(format!(
                "need the same non-zero number of feature and label rows, got {} and {}",
                x.rows, y.rows
            )));
        }
        if self.is_empty() {
            return Err(NetworkError::EmptyGraph);
        }
        validate_config(config)?;

        let kind = config.optimizer.or(self.optimizer).unwrap_or_default();
        self.optimizer = Some(kind);
        self.add_cost_layer()?;
        self.check_input(x)?;
        self.check_labels(x, y)?;

        let split = split_data(x, y, &config.split, &mut self.rng)?;
        let train_len = split.train.len();
        let batch_size = config.batch_size.min(train_len);
        let random_batches = batch_size < train_len;
        let batches = batches_per_epoch(train_len, batch_size);
        let ctx = StepContext::new(config.lr, config.lb, batch_size, config.apply_bias);

        let mut state = OptimizerState::new(kind, &self.weights, &self.bias, config.epochs);
        let mut logs = FitLogs::new(config.metrics.iter().map(|m| m.name().to_owned()).collect());

        info!(
            optimizer = %kind,
            epochs = config.epochs,
            batch_size,
            train = train_len,
            validation = split.validation.len(),
            test = split.test.len(),
            "fit started"
        );

        for epoch in 1..=config.epochs {
            if let Some(ref flag) = config.stop_flag {
                if flag.load(Ordering::Relaxed) {
                    warn!(epoch, "stop requested, ending fit early");
                    break;
                }
            }

            let t_start = Instant::now();
            state.update_schedule();

            for _ in 0..batches {
                if random_batches {
                    let picks: Vec<usize> = (0..batch_size)
                        .map(|_| self.rng.gen_range(0..train_len))
                        .collect();
                    let x_batch = split.train.x.select_rows(&picks);
                    let y_batch = split.train.y.select_rows(&picks);
                    train_step(self, &mut state, &x_batch, &y_batch, &ctx)?;
                } else {
                    train_step(self, &mut state, &split.train.x, &split.train.y, &ctx)?;
                }
            }

            let train_loss = self.mean_cost(&split.train.x, &split.train.y);
            logs.train_loss.push(train_loss);
            if config.do_log {
                self.append_log(&mut logs, &split.validation, config, false);
            }

            if epoch % config.record_period == 0 {
                let val_metrics = logs.latest();
                let val_loss = if config.do_log && config.show_loss { logs.loss.last().copied() } else { None };
                info!(epoch, train_loss, ?val_metrics, ?val_loss, "epoch");

                let stats = EpochStats {
                    epoch,
                    total_epochs: config.epochs,
                    train_loss,
                    val_metrics,
                    val_loss,
                    elapsed_ms: t_start.elapsed().as_millis() as u64,
                };
                if let Some(ref tx) = config.progress_tx {
                    if tx.send(stats).is_err() {
                        warn!(epoch, "progress receiver dropped, ending fit early");
                        break;
                    }
                }
            }
        }

        if config.do_log {
            self.append_log(&mut logs, &split.test, config, true);
        }
        self.logs = Some(logs.clone());
        Ok(logs)
    }

    fn append_log(&self, logs: &mut FitLogs, part: &Partition, config: &TrainConfig, test: bool) {
        let prediction = self.trace_predict(&part.x).output().clone();
        let values = config.metrics.iter().map(|m| m.evaluate(&part.y, &prediction));
        if test {
            logs.test = values.collect();
        } else {
            for (history, value) in logs.metrics.iter_mut().zip(values) {
                history.push(value);
            }
        }
        if config.show_loss {
            let loss = self.mean_cost(&part.x, &part.y);
            if test { logs.test_loss = Some(loss) } else { logs.loss.push(loss) }
        }
    }
}

/// Mini-batches drawn per epoch: one more than fit in the training set, so
/// a full-batch run still takes two steps per epoch.
fn batches_per_epoch(train_len: usize, batch_size: usize) -> usize {
    train_len / batch_size + 1
}

fn validate_config(config: &TrainConfig) -> Result<()> {
    let checks = [
        (config.epochs > 0, "epochs must be positive"),
        (config.batch_size > 0, "batch_size must be positive"),
        (config.record_period > 0, "record_period must be positive"),
        (config.lr.is_finite() && config.lr > 0.0, "lr must be finite and positive"),
        (config.lb.is_finite() && config.lb >= 0.0, "lb must be finite and non-negative"),
    ];
    match checks.iter().find(|(ok, _)| !ok) {
        Some((_, msg)) => Err(NetworkError::InvalidParameter((*msg).to_owned())),
        None => Ok(()),
    }
}
