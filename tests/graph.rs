use ferrite_chain::{
    ActivationFunction, BuildSpec, Layer, LayerShape, Matrix, Network, NetworkError,
};

fn closed() -> Network {
    let mut net = Network::new();
    net.add(Layer::dense(ActivationFunction::ReLU, 4, 3)).unwrap();
    net.add_named("MSE", None).unwrap();
    net
}

#[test]
fn every_layer_kind_is_rejected_after_a_cost_layer() {
    let names = [
        "Identical", "Sigmoid", "Tanh", "ReLU", "ELU", "Softplus", "Softmax",
        "Dropout", "MSE", "Cross Entropy", "Log Likelihood", "NotALayer",
    ];
    for name in names {
        let mut net = closed();
        let param = if name == "Dropout" { None } else { Some("3") };
        assert!(
            matches!(net.add_named(name, param), Err(NetworkError::GraphClosed { .. })),
            "{} was accepted",
            name
        );
        assert_eq!(net.len(), 2);
    }

    let mut net = closed();
    assert!(matches!(
        net.add(Layer::dense(ActivationFunction::Tanh, 3, 3)),
        Err(NetworkError::GraphClosed { .. })
    ));
    assert!(matches!(net.add(Layer::dropout(0.9).unwrap()), Err(NetworkError::GraphClosed { .. })));
}

#[test]
fn widths_must_chain() {
    let mut net = Network::new();
    net.add(Layer::dense(ActivationFunction::Sigmoid, 4, 6)).unwrap();

    assert!(matches!(
        net.add(Layer::dense(ActivationFunction::Sigmoid, 5, 3)),
        Err(NetworkError::ShapeMismatch(_))
    ));
    assert!(matches!(
        net.add(Layer::dropout(0.5).unwrap().with_shape(LayerShape::Full(3, 3))),
        Err(NetworkError::ShapeMismatch(_))
    ));
    net.add(Layer::dropout(0.5).unwrap().with_shape(LayerShape::Full(6, 6))).unwrap();
    net.add(Layer::stacked(ActivationFunction::Softmax, 2)).unwrap();
    assert_eq!(net.layer_shapes(), vec![(4, 6), (6, 6), (6, 2)]);
    assert_eq!(net.current_dimension(), 2);
}

#[test]
fn registry_errors_are_distinct() {
    let mut net = Network::new();
    net.add(Layer::dense(ActivationFunction::Tanh, 2, 2)).unwrap();
    assert!(matches!(net.add_named("Maxout", Some("2")), Err(NetworkError::UnknownKind { .. })));
    assert!(matches!(net.add_named("Dropout", Some("often")), Err(NetworkError::InvalidParameter(_))));
    assert!(matches!(net.add_named("Dropout", Some("1.5")), Err(NetworkError::InvalidParameter(_))));
    assert!(matches!(net.set_optimizer("Adagrad"), Err(NetworkError::UnknownKind { .. })));
    assert_eq!(net.len(), 1);

    let x = Matrix::zeros(1, 2);
    assert!(matches!(
        net.evaluate_named(&x, &x, &["acc", "auc"]),
        Err(NetworkError::UnknownKind { kind: "metric", .. })
    ));
}

#[test]
fn quick_build_stacks_sigmoids_and_closes() {
    let mut net = Network::new();
    net.build(BuildSpec::Widths(vec![4, 6, 3])).unwrap();
    assert_eq!(net.layer_names(), vec!["Sigmoid", "Sigmoid", "Cross Entropy"]);
    assert_eq!(net.layer_shapes(), vec![(4, 6), (6, 3), (3, 3)]);
    assert!(net.is_closed());
    assert_eq!(net.input_dim(), Some(4));

    for widths in [vec![3], vec![3, 0, 2], vec![]] {
        assert!(matches!(
            net.build(BuildSpec::Widths(widths)),
            Err(NetworkError::InvalidParameter(_))
        ));
    }
    // The failed builds left the previous graph in place.
    assert_eq!(net.len(), 3);
}

#[test]
fn parameters_stay_index_aligned() {
    let mut net = Network::new();
    net.add(Layer::dense(ActivationFunction::Elu, 3, 5)).unwrap();
    net.add_named("Dropout", Some("0.7")).unwrap();
    net.add_named("Softplus", Some("4")).unwrap();
    net.add_named("Dropout", None).unwrap();
    net.add_cost_layer().unwrap();

    assert_eq!(net.weights().len(), net.len());
    assert_eq!(net.bias().len(), net.len());
    assert_eq!(net.layer_params(), &[None, Some(0.7), None, Some(0.5), None]);

    for i in 0..net.len() {
        let view = net.layer(i).unwrap();
        let (input, output) = view.layer.dims().unwrap();
        assert_eq!(view.bias, &Matrix::zeros(1, output));
        if view.layer.is_sub_layer() {
            assert_eq!(view.weight, &Matrix::identity(output));
        } else {
            assert_eq!(view.weight.shape(), (input, output));
            assert!(view.weight.data.iter().flatten().all(|w| (-1.0..1.0).contains(w)));
        }
    }
    assert!(net.layer(5).is_none());
}

#[test]
fn same_seed_same_weights() {
    let mut a = Network::with_seed(11);
    let mut b = Network::with_seed(11);
    a.build(BuildSpec::Widths(vec![3, 4, 2])).unwrap();
    b.build(BuildSpec::Widths(vec![3, 4, 2])).unwrap();
    assert_eq!(a.weights(), b.weights());
}
