use graph::GraphInput;
use network::{NetworkRiskAnalyzer, PatternConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

fn random_input(rng: &mut StdRng) -> GraphInput {
    let node_count = rng.gen_range(0..25);
    let mut nodes = serde_json::Map::new();
    for i in 0..node_count {
        let attributes = if rng.gen_bool(0.3) {
            json!({"risk_score": rng.gen_range(0.0..=1.0)})
        } else {
            json!({})
        };
        nodes.insert(format!("acct_{i:02}"), attributes);
    }

    let mut edges = Vec::new();
    if node_count > 0 {
        for _ in 0..rng.gen_range(0..60) {
            let source = rng.gen_range(0..node_count);
            let target = rng.gen_range(0..node_count);
            let amount = if rng.gen_bool(0.1) {
                rng.gen_range(5_000.0..50_000.0)
            } else {
                rng.gen_range(1.0..500.0)
            };
            edges.push(json!({
                "source": format!("acct_{source:02}"),
                "target": format!("acct_{target:02}"),
                "amount": amount,
                "timestamp": rng.gen_range(1_600_000_000i64..1_700_000_000),
            }));
        }
    }

    serde_json::from_value(json!({"nodes": Value::Object(nodes), "edges": edges})).unwrap()
}

#[test]
fn test_random_graphs_stay_in_bounds() {
    let analyzer = NetworkRiskAnalyzer::default();

    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let input = random_input(&mut rng);
        let risk = analyzer.score(&input);
        assert!((0.0..=1.0).contains(&risk), "seed {seed} produced {risk}");
    }
}

#[test]
fn test_scoring_is_idempotent() {
    let analyzer = NetworkRiskAnalyzer::default();

    for seed in [3, 17, 99] {
        let mut rng = StdRng::seed_from_u64(seed);
        let input = random_input(&mut rng);

        let first = analyzer.analyze_input(&input).unwrap();
        let second = analyzer.analyze_input(&input).unwrap();
        assert_eq!(first.network_risk.to_bits(), second.network_risk.to_bits());
        assert_eq!(first, second);
    }
}

#[test]
fn test_cycle_raises_risk() {
    let analyzer = NetworkRiskAnalyzer::default();

    let cyclic: GraphInput = serde_json::from_value(json!({"edges": [
        {"source": "a", "target": "b", "amount": 100.0},
        {"source": "b", "target": "c", "amount": 100.0},
        {"source": "c", "target": "a", "amount": 100.0}
    ]}))
    .unwrap();

    let report = analyzer.analyze_input(&cyclic).unwrap();
    assert_eq!(report.cycles.count, 1);
    assert_eq!(report.cycles.penalty, 0.05);
    assert_eq!(report.outliers.outliers, 0);

    // Every node: degree 1, betweenness 0.5, influence 1/3
    let expected_base = 0.3 + 0.4 * 0.5 + 0.3 / 3.0;
    assert!((report.base_risk - expected_base).abs() < 1e-9);
    assert!((report.network_risk - (expected_base + 0.05)).abs() < 1e-9);
}

#[test]
fn test_acyclic_chain_has_no_pattern_penalty() {
    let analyzer = NetworkRiskAnalyzer::default();

    let chain: GraphInput = serde_json::from_value(json!({"edges": [
        {"source": "a", "target": "b", "amount": 100.0},
        {"source": "b", "target": "c", "amount": 100.0}
    ]}))
    .unwrap();

    let report = analyzer.analyze_input(&chain).unwrap();
    assert_eq!(report.cycles.count, 0);
    assert_eq!(report.cycles.penalty, 0.0);
    assert_eq!(report.network_risk, report.base_risk);
}

#[test]
fn test_outlier_penalty_applies() {
    let analyzer = NetworkRiskAnalyzer::default();

    let input: GraphInput = serde_json::from_value(json!({"edges": [
        {"source": "a", "target": "b", "amount": 100.0},
        {"source": "a", "target": "c", "amount": 100.0},
        {"source": "a", "target": "d", "amount": 100.0},
        {"source": "a", "target": "e", "amount": 100.0},
        {"source": "a", "target": "f", "amount": 10000.0}
    ]}))
    .unwrap();

    let report = analyzer.analyze_input(&input).unwrap();
    assert_eq!(report.outliers.outliers, 1);
    assert!((report.network_risk - (report.base_risk + 0.03)).abs() < 1e-12);
}

#[test]
fn test_saturated_enumeration_uses_cap() {
    let config = network::NetworkConfig {
        patterns: PatternConfig {
            max_cycles: 10,
            ..PatternConfig::default()
        },
        ..network::NetworkConfig::default()
    };
    let analyzer = NetworkRiskAnalyzer::new(config).unwrap();

    let ids = ["a", "b", "c", "d", "e"];
    let mut edges = Vec::new();
    for s in ids {
        for t in ids {
            if s != t {
                edges.push(json!({"source": s, "target": t, "amount": 1.0}));
            }
        }
    }
    let input: GraphInput = serde_json::from_value(json!({"edges": edges})).unwrap();

    let report = analyzer.analyze_input(&input).unwrap();
    assert!(report.cycles.saturated);
    assert_eq!(report.cycles.penalty, 0.20);
    assert!(report.network_risk <= 1.0);
}

#[test]
fn test_empty_and_malformed_inputs_are_neutral() {
    let analyzer = NetworkRiskAnalyzer::default();

    assert_eq!(analyzer.score(&GraphInput::default()), 0.5);

    let malformed: GraphInput = serde_json::from_value(json!({"edges": [
        {"source": "a", "target": "b"},
        {"target": "c"}
    ]}))
    .unwrap();
    let assessment = analyzer.assess(&malformed);
    assert_eq!(assessment.network_risk, 0.5);
    assert!(assessment.failure.unwrap().contains("source"));
}

#[test]
fn test_node_risks_by_id() {
    let analyzer = NetworkRiskAnalyzer::default();
    let input: GraphInput = serde_json::from_value(json!({
        "nodes": {"hub": {"risk_score": 1.0}},
        "edges": [
            {"source": "x", "target": "hub"},
            {"source": "hub", "target": "y"}
        ]
    }))
    .unwrap();

    let report = analyzer.analyze_input(&input).unwrap();
    let risks = report.node_risks();
    assert_eq!(risks.len(), 3);
    assert!(risks["hub"] > risks["x"]);
    assert!(risks["hub"] > risks["y"]);
}
