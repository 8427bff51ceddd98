//! Integration tests for the DiagramBuilder API

use layerscape::{
    DiagramBuilder, LayerscapeError,
    config::{AppConfig, GraphConfig, LayeredConfig, SizingConfig, StyleConfig},
    description::ModelDescription,
    draw::PrimitiveKind,
};

const CNN: &str = r#"{
    "name": "cnn",
    "layers": [
        {"name": "input", "kind": "InputLayer", "batch_shape": [null, 8, 8, 3]},
        {"name": "conv", "kind": "Conv2D", "output_shape": [null, 8, 8, 16], "filters": 16,
         "inbound_nodes": [{"inbound_layers": "input"}]},
        {"name": "pool", "kind": "GlobalAveragePooling2D", "output_shape": [null, 16],
         "inbound_nodes": [{"inbound_layers": "conv"}]}
    ]
}"#;

fn accurate_flat() -> AppConfig {
    let layered = LayeredConfig::default()
        .with_draw_volume(false)
        .with_sizing(
            SizingConfig::default()
                .with_scale(0.1, 4.0)
                .with_min(20.0, 20.0),
        );
    AppConfig::new(layered, GraphConfig::default(), StyleConfig::default())
}

#[test]
fn test_linear_stack_end_to_end() {
    let model = ModelDescription::from_json(CNN).unwrap();
    let builder = DiagramBuilder::new(accurate_flat());
    let mut wheel = builder.color_wheel().unwrap();

    let scene = builder.layered_view(&model, &mut wheel).unwrap();
    let boxes = scene.primitives();
    assert_eq!(boxes.len(), 3);

    for pair in boxes.windows(2) {
        assert!(pair[0].bounds().min_x() < pair[1].bounds().min_x());
        assert!(!pair[0].bounds().intersects(&pair[1].bounds()));
    }

    let config = builder.config().layered();
    let depths: f32 = boxes.iter().map(|b| b.bounds().width()).sum();
    let expected = depths + 2.0 * config.spacing() + 2.0 * config.padding();
    assert!((scene.size().width() - expected).abs() < 1e-3);

    // depths clamp to the minimum, heights follow 8 * 4
    assert_eq!(boxes[0].bounds().width(), 20.0);
    assert_eq!(boxes[0].bounds().height(), 32.0);
    assert_eq!(boxes[2].bounds().height(), 20.0);
    assert_eq!(scene.connectors().len(), 8);
}

#[test]
fn test_render_layered_svg() {
    let model = ModelDescription::from_json(CNN).unwrap();
    let builder = DiagramBuilder::default();
    let mut wheel = builder.color_wheel().unwrap();

    let scene = builder.layered_view(&model, &mut wheel).unwrap();
    let svg = builder.render_svg(&scene).unwrap();
    assert!(svg.contains("<svg"), "Output should contain SVG tag");
    assert!(svg.contains("</svg>"), "Output should be complete SVG");
    assert!(svg.contains(r#"data-layer="shape""#));
    assert_eq!(svg.matches("<polygon").count(), 2 * 3);
}

#[test]
fn test_wheel_is_shared_across_views() {
    let model = ModelDescription::from_json(CNN).unwrap();
    let builder = DiagramBuilder::default();
    let mut wheel = builder.color_wheel().unwrap();

    let first = builder.layered_view(&model, &mut wheel).unwrap();
    let second = builder.layered_view(&model, &mut wheel).unwrap();
    assert_eq!(first.color_assignments(), second.color_assignments());
    assert_eq!(wheel.assigned(), 3);
}

#[test]
fn test_graph_view_ellipsis() {
    let json = r#"{
        "name": "wide",
        "layers": [
            {"name": "in", "kind": "InputLayer", "batch_shape": [null, 2], "units": 2},
            {"name": "wide", "kind": "Dense", "units": 50,
             "inbound_nodes": [{"parent_nodes": ["in"]}]}
        ],
        "outputs": ["wide"]
    }"#;
    let mut model = ModelDescription::from_json(json).unwrap();
    let config = AppConfig::new(
        LayeredConfig::default(),
        GraphConfig::default().with_ellipsize_after(10),
        StyleConfig::default(),
    );
    let builder = DiagramBuilder::new(config);
    let scene = builder.graph_view(&mut model).unwrap();

    let wide: Vec<_> = scene
        .primitives()
        .iter()
        .filter(|p| p.layer().is_some_and(|l| l.index() == 1))
        .collect();
    assert_eq!(wide.len(), 10);
    assert_eq!(wide[8].kind(), PrimitiveKind::Ellipsis);

    let marker = wide[8].bounds();
    for connector in scene.connectors() {
        assert_ne!(connector.to(), marker.left_middle());
        assert_ne!(connector.from(), marker.right_middle());
    }
    // 2 * 9 into the wide layer, 9 * 1 into the output box
    assert_eq!(scene.connectors().len(), 18 + 9);

    let svg = builder.render_svg(&scene).unwrap();
    assert_eq!(svg.matches(r#"data-layer="connector""#).count(), 1);
}

#[test]
fn test_unsupported_shape_is_fatal() {
    let json = r#"{"name": "bad", "layers": [{"name": "x", "kind": "Dense", "output_shape": 123}]}"#;
    let model = ModelDescription::from_json(json).unwrap();
    let builder = DiagramBuilder::default();
    let mut wheel = builder.color_wheel().unwrap();

    let result = builder.layered_view(&model, &mut wheel);
    assert!(matches!(result, Err(LayerscapeError::UnsupportedShape { .. })));
}

#[test]
fn test_config_from_toml_like_json() {
    // AppConfig is plain serde; any format works
    let config: AppConfig = serde_json::from_str(
        r#"{"layered": {"sizing": {"sizing_mode": "capped"}}, "graph": {"node_size": 20}}"#,
    )
    .unwrap();
    assert_eq!(config.graph().node_size(), 20.0);
}
