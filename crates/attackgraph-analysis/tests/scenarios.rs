//! End-to-end scenarios: entity documents in, analysis results out.

use attackgraph_analysis::{
    centrality, impact, paths, structure, surface, AnalysisEngine, AnalysisError, AttackGraph,
    GraphBuilder,
};
use attackgraph_core::loader::{parse_entities, InputFormat};
use attackgraph_core::EntitySet;

const SCENARIO: &str = r#"{
    "hosts": [
        {"id": "attacker", "label": "Attacker"},
        {"id": "web", "label": "Web server", "zone": "dmz"},
        {"id": "db", "label": "Database", "zone": "internal"}
    ],
    "privileges": [
        {"id": "priv_web", "level": "user", "host": "web"},
        {"id": "priv_db", "level": "root", "host": "db"}
    ],
    "exploits": [
        {"id": "web_rce", "precondition": "attacker", "postcondition": "priv_web"},
        {"id": "pivot", "precondition": "priv_web", "postcondition": "priv_db"}
    ],
    "network_edges": [
        {"from": "attacker", "to": "web"}
    ]
}"#;

const POSITIONED_VULN: &str = r#"
[[hosts]]
id = "internet"

[[hosts]]
id = "web"

[[vulnerabilities]]
id = "cve"
cvss_score = SEVERITY
affected_host = "web"

[[privileges]]
id = "root_web"
level = "root"

[[exploits]]
id = "rce"
vulnerability = "cve"
precondition = "web"
postcondition = "root_web"

[[network_edges]]
from = "internet"
to = "web"
"#;

fn entities(text: &str) -> EntitySet {
    parse_entities(text, InputFormat::detect(text)).unwrap()
}

fn scenario_graph() -> AttackGraph {
    attackgraph_analysis::build(&entities(SCENARIO)).unwrap()
}

fn ids(path: &[&str]) -> Vec<String> {
    path.iter().map(|s| s.to_string()).collect()
}

#[test]
fn scenario_paths_and_surfaces() {
    let graph = scenario_graph();
    let expected = ids(&["attacker", "web_rce", "priv_web", "pivot", "priv_db"]);

    let found = paths::find_paths(&graph, "attacker", "priv_db", 10, 20).unwrap();
    assert_eq!(found, vec![expected.clone()]);
    assert_eq!(
        paths::shortest_path(&graph, "attacker", "priv_db").unwrap(),
        expected
    );
    assert!(structure::graph_density(&graph) > 0.0);

    let surfaces = surface::find_attack_surfaces(&graph);
    assert_eq!(surfaces[0].id, "attacker");
    assert_eq!(surfaces[0].reachable_nodes, 5);
}

#[test]
fn shortest_path_never_longer_than_enumerated_paths() {
    let text = r#"{
        "hosts": [{"id": "a"}, {"id": "b"}, {"id": "c"}, {"id": "d"}, {"id": "e"}],
        "network_edges": [
            {"from": "a", "to": "b"}, {"from": "b", "to": "c"}, {"from": "c", "to": "e"},
            {"from": "a", "to": "d"}, {"from": "d", "to": "e"}, {"from": "b", "to": "e"}
        ]
    }"#;
    let graph = attackgraph_analysis::build(&entities(text)).unwrap();
    let shortest = paths::shortest_path(&graph, "a", "e").unwrap();
    let all = paths::find_paths(&graph, "a", "e", 100, 10).unwrap();

    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|p| p.len() >= shortest.len()));
    assert!(paths::find_paths(&graph, "a", "e", 2, 10).unwrap().len() <= 2);
    assert!(paths::find_paths(&graph, "a", "e", 100, 2)
        .unwrap()
        .iter()
        .all(|p| p.len() - 1 <= 2));

    let k = paths::k_shortest_paths(&graph, "a", "e", 3).unwrap();
    let lengths: Vec<usize> = k.iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![3, 3, 4]);
}

#[test]
fn unresolved_affected_host_names_both_ids() {
    let text = r#"{
        "hosts": [{"id": "web"}],
        "vulnerabilities": [{"id": "CVE-2024-0001", "severity": 7.5, "affected_host": "ghost"}]
    }"#;
    let err = attackgraph_analysis::build(&entities(text)).unwrap_err();
    match &err {
        AnalysisError::UnresolvedReference {
            entity_id,
            missing_id,
            ..
        } => {
            assert_eq!(entity_id, "CVE-2024-0001");
            assert_eq!(missing_id, "ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("CVE-2024-0001"));
    assert!(message.contains("ghost"));
}

#[test]
fn severity_raises_impact_at_same_position() {
    let score = |severity: &str| {
        let set = entities(&POSITIONED_VULN.replace("SEVERITY", severity));
        let graph = GraphBuilder::new()
            .with_reference_edges(true)
            .build(&set)
            .unwrap();
        impact::vulnerability_impact_score(&graph, "cve").unwrap()
    };
    let high = score("9.8");
    let low = score("4.0");
    assert!(high.impact_score > low.impact_score);
    assert_eq!(high.reachable_nodes, low.reachable_nodes);
    assert!(high.impact_score <= 10.0);
}

#[test]
fn degree_sums_hold_for_every_node() {
    let graph = scenario_graph();
    let rows = centrality::degree_centrality(&graph, usize::MAX);
    assert_eq!(rows.len(), graph.node_count());
    for row in rows {
        assert_eq!(row.total_degree, row.in_degree + row.out_degree);
    }
}

#[test]
fn components_partition_nodes() {
    let text = r#"{
        "hosts": [{"id": "a"}, {"id": "b"}, {"id": "c"}, {"id": "lone"}],
        "network_edges": [
            {"from": "a", "to": "b"}, {"from": "b", "to": "a"}, {"from": "b", "to": "c"}
        ]
    }"#;
    let graph = attackgraph_analysis::build(&entities(text)).unwrap();
    let components = structure::strongly_connected_components(&graph);
    assert_eq!(components.len(), 3);

    let mut members: Vec<String> = components.into_iter().flatten().collect();
    members.sort();
    assert_eq!(members, ids(&["a", "b", "c", "lone"]));
    assert_eq!(structure::find_cycles(&graph), vec![ids(&["a", "b"])]);
}

#[test]
fn rebuild_yields_equal_structure_and_new_identity() {
    let set = entities(SCENARIO);
    let first = attackgraph_analysis::build(&set).unwrap();
    let second = attackgraph_analysis::build(&set).unwrap();

    assert_ne!(first.id(), second.id());
    assert!(first.same_structure(&second));
    assert_eq!(first.fingerprint(), second.fingerprint());

    let linked = GraphBuilder::new()
        .with_reference_edges(true)
        .build(&set)
        .unwrap();
    assert!(!linked.same_structure(&first));
}

#[test]
fn queries_run_in_parallel_on_one_snapshot() {
    let graph = scenario_graph();
    let sequential = paths::find_paths(&graph, "attacker", "priv_db", 10, 20).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let found = paths::find_paths(&graph, "attacker", "priv_db", 10, 20).unwrap();
                    let chokepoints = surface::find_chokepoints(&graph, 3);
                    (found, chokepoints.len())
                })
            })
            .collect();
        for handle in handles {
            let (found, chokepoints) = handle.join().unwrap();
            assert_eq!(found, sequential);
            assert_eq!(chokepoints, 3);
        }
    });
}

#[test]
fn query_errors_leave_snapshot_usable() {
    let graph = scenario_graph();
    assert!(matches!(
        paths::shortest_path(&graph, "attacker", "nowhere"),
        Err(AnalysisError::NodeNotFound { .. })
    ));
    assert_eq!(paths::shortest_path(&graph, "web", "db").unwrap(), Vec::<String>::new());
    assert_eq!(
        paths::shortest_path(&graph, "attacker", "web").unwrap(),
        ids(&["attacker", "web"])
    );
}

#[test]
fn engine_report_from_yaml() {
    let text = r#"
hosts:
  - id: attacker
  - id: web
vulnerabilities:
  - id: cve
    cvss: 8.1
    affected_host: web
network_edges:
  - from: attacker
    to: web
"#;
    let engine = AnalysisEngine::new();
    let graph = engine.load(text, Some(InputFormat::Yaml)).unwrap();
    let report = engine.report(&graph).unwrap();

    assert_eq!(report.graph_stats.total_nodes, 3);
    assert_eq!(report.graph_stats.total_edges, 1);
    assert_eq!(report.snapshot_id, graph.id().to_string());
    assert_eq!(report.vulnerability_impacts.len(), 1);
    assert_eq!(report.vulnerability_impacts[0].vulnerability_id, "cve");

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["graph_stats"]["nodes_by_type"]["vulnerability"].is_number());
}
