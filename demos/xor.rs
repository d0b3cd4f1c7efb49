use ferrite_chain::{ActivationFunction, Layer, Matrix, Network, OptimizerKind, TrainConfig};

fn main() {
    let mut network = Network::new();
    network.add(Layer::dense(ActivationFunction::Tanh, 2, 4)).expect("first layer");
    network.add_named("Softmax", Some("2")).expect("output layer");

    let x = Matrix::from_data(vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ]);
    let y = Matrix::from_data(vec![
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
    ]);

    let config = TrainConfig {
        lr: 0.05,
        ..TrainConfig::new(1000, 4, Some(OptimizerKind::Adam))
    }
    .train_only();

    let logs = network.fit(&x, &y, &config).expect("training failed");
    for (epoch, loss) in logs.train_loss.iter().enumerate().step_by(100) {
        println!("Epoch {epoch}: loss = {loss:.6}");
    }

    println!("{}", network);
    for row in &x.data {
        let out = network.predict_one(row).expect("prediction failed");
        println!("Input: {:?} -> Output: [{:.4}, {:.4}]", row, out[0], out[1]);
    }
}
