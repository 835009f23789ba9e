//! Known-topology pipeline tests: graph → components → discovery → pack →
//! catalog → fair selection.
//!
//! Each test uses a hand-crafted graph with analytically known cycles, so
//! any algorithm change that shifts the selected sample is caught here.

use std::collections::{BTreeSet, HashMap};

use gyre_core::{DepGraph, GraphRecord, cyclic_components};
use gyre_sample::catalog::{CatalogConfig, CatalogInput, build_catalog};
use gyre_sample::corpus::{CandidatePool, RepoSpec};
use gyre_sample::select::{SizeOrder, select_fair};
use gyre_sample::{CanonMode, Strategy};

fn dep_graph(edges: &[(&str, &str)]) -> DepGraph {
    let nodes: BTreeSet<&str> = edges.iter().flat_map(|(s, t)| [*s, *t]).collect();
    let record: GraphRecord = serde_json::from_value(serde_json::json!({
        "nodes": nodes.iter().map(|id| serde_json::json!({"id": id})).collect::<Vec<_>>(),
        "edges": edges
            .iter()
            .map(|(s, t)| serde_json::json!({"source": s, "target": t}))
            .collect::<Vec<_>>(),
    }))
    .expect("valid record");
    DepGraph::from_record(&record)
}

fn repo(name: &str) -> RepoSpec {
    RepoSpec {
        name: name.to_string(),
        branch: "main".to_string(),
        entry: None,
        language: None,
    }
}

fn exact_config() -> CatalogConfig {
    CatalogConfig {
        strategy: Strategy::Exact,
        mode: CanonMode::DirectionPreserving,
        ..CatalogConfig::default()
    }
}

fn input(repo: &str) -> CatalogInput {
    CatalogInput {
        repo: repo.to_string(),
        base_branch: "main".to_string(),
        dependency_graph: "graph.json".to_string(),
        graph_hash: String::new(),
    }
}

/// The walked example from end to end: nodes {a,b,c,d}, edges a→b, b→c,
/// c→a, c→d. One cyclic component {a,b,c}, exactly one cycle of length 3
/// with canonical key (a,b,c), and the packer returns that single cycle.
#[test]
fn four_node_example_yields_one_cycle() {
    let dep = dep_graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
    let components = cyclic_components(&dep);

    assert_eq!(components.len(), 1);
    assert_eq!(components[0].members, vec!["a", "b", "c"]);

    let catalog = build_catalog(
        &dep,
        &components,
        &HashMap::new(),
        &exact_config(),
        input("demo"),
    );
    assert_eq!(catalog.summary.cycle_count, 1);
    let cycle = &catalog.sccs[0].cycles[0];
    assert_eq!(cycle.length, 3);
    assert_eq!(cycle.nodes, vec!["a", "b", "c"]);
    assert_eq!(cycle.edges[2].source, "c");
    assert_eq!(cycle.edges[2].target, "a");
}

/// No directed edge appears in more than one packed cycle, across every
/// component of a dense graph, for both strategies.
#[test]
fn packed_catalogs_are_edge_disjoint() {
    let dep = dep_graph(&[
        ("a", "b"),
        ("b", "c"),
        ("c", "a"),
        ("b", "a"),
        ("c", "b"),
        ("a", "c"),
        ("x", "y"),
        ("y", "x"),
    ]);
    let components = cyclic_components(&dep);

    for strategy in [Strategy::Exact, Strategy::Sample] {
        let config = CatalogConfig {
            strategy,
            ..exact_config()
        };
        let catalog = build_catalog(&dep, &components, &HashMap::new(), &config, input("demo"));

        for component in &catalog.sccs {
            let mut used: BTreeSet<(String, String)> = BTreeSet::new();
            for cycle in &component.cycles {
                for edge in &cycle.edges {
                    assert!(
                        used.insert((edge.source.clone(), edge.target.clone())),
                        "edge {}→{} appears in two cycles of {}",
                        edge.source,
                        edge.target,
                        component.id
                    );
                }
            }
        }
    }
}

/// Identical inputs, configuration, and seed produce byte-identical
/// catalogs — the full-pipeline determinism property.
#[test]
fn pipeline_is_byte_deterministic() {
    let edges = [
        ("a", "b"),
        ("b", "c"),
        ("c", "d"),
        ("d", "a"),
        ("b", "a"),
        ("c", "a"),
        ("d", "b"),
    ];
    let config = CatalogConfig::default();

    let render = || {
        let dep = dep_graph(&edges);
        let components = cyclic_components(&dep);
        let catalog = build_catalog(&dep, &components, &HashMap::new(), &config, input("demo"));
        serde_json::to_string_pretty(&catalog).expect("serialize")
    };

    assert_eq!(render(), render());
}

/// A changed seed is allowed to change the sampled candidate set, but the
/// run with the same seed must reproduce itself.
#[test]
fn sampling_seed_controls_catalog() {
    let edges = [
        ("a", "b"),
        ("b", "c"),
        ("c", "a"),
        ("b", "d"),
        ("d", "a"),
        ("c", "d"),
        ("d", "c"),
    ];
    let dep = dep_graph(&edges);
    let components = cyclic_components(&dep);

    let with_seed = |seed: u64| {
        let config = CatalogConfig {
            seed,
            ..CatalogConfig::default()
        };
        let catalog = build_catalog(&dep, &components, &HashMap::new(), &config, input("demo"));
        serde_json::to_string_pretty(&catalog).expect("serialize")
    };

    assert_eq!(with_seed(42), with_seed(42));
}

/// Catalogs from two repositories feed the fair sampler; quotas spread the
/// picks over lengths and repositories deterministically.
#[test]
fn catalogs_to_selection_round_trip() {
    // Repo one: a triangle and a 2-cycle. Repo two: two disjoint 2-cycles.
    let one = dep_graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("p", "q"), ("q", "p")]);
    let two = dep_graph(&[("x", "y"), ("y", "x"), ("u", "v"), ("v", "u")]);

    let mut pool: CandidatePool = CandidatePool::new();
    for (name, dep) in [("one", &one), ("two", &two)] {
        let components = cyclic_components(dep);
        let catalog = build_catalog(
            dep,
            &components,
            &HashMap::new(),
            &exact_config(),
            input(name),
        );
        for component in &catalog.sccs {
            for cycle in &component.cycles {
                pool.entry(cycle.length)
                    .or_default()
                    .entry(name.to_string())
                    .or_default()
                    .push(cycle.id.clone());
            }
        }
    }

    let repos = vec![repo("one"), repo("two")];
    let outcome = select_fair(&pool, &repos, 3, SizeOrder::Descending).expect("select");

    assert_eq!(outcome.picks.len(), 3);
    assert_eq!(outcome.shortfall, 0);
    // Both repositories are represented.
    assert!(outcome.selected_per_repo.contains_key("one"));
    assert!(outcome.selected_per_repo.contains_key("two"));
    // Length 3 exists only in repo one; it must be the length-3 pick.
    let length_three = outcome
        .picks
        .iter()
        .find(|p| p.length == 3)
        .expect("a length-3 pick");
    assert_eq!(length_three.repo, "one");
}
