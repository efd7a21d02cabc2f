use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sutra::graph::{properties, Graph, NodeId};
use sutra::query::{
    EdgePattern, LengthPattern, MatchOptions, NodePattern, PathPattern, PatternSymbol, RecordBatch,
    Symbols, Value,
};

const LABELS: [&str; 3] = ["Person", "City", "Company"];
const TYPES: [&str; 2] = ["KNOWS", "WORKS_AT"];

fn random_graph(seed: u64, nodes: usize, edges: usize) -> (Graph, Vec<NodeId>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = Graph::new();
    graph.add_node_property_index("group").unwrap();

    let ids: Vec<NodeId> = (0..nodes)
        .map(|_| {
            let label = LABELS[rng.gen_range(0..LABELS.len())];
            let group = rng.gen_range(0..4i64);
            graph.new_node([label], properties([("group", group)])).unwrap()
        })
        .collect();
    for _ in 0..edges {
        let source = ids[rng.gen_range(0..ids.len())];
        let target = ids[rng.gen_range(0..ids.len())];
        let edge_type = TYPES[rng.gen_range(0..TYPES.len())];
        graph
            .new_edge(source, target, edge_type, properties([("w", rng.gen_range(0..3i64))]))
            .unwrap();
    }
    (graph, ids)
}

fn sorted_paths(graph: &Graph, pattern: &PathPattern, symbols: &Symbols, pivot: Option<usize>) -> Vec<Vec<Value>> {
    let mut rows = RecordBatch::new();
    pattern
        .run_with_options(graph, symbols, &MatchOptions { pivot, limit: None }, &mut rows)
        .unwrap();
    let mut paths: Vec<Vec<Value>> = rows.records.into_iter().map(|r| r.path).collect();
    paths.sort();
    paths
}

fn assert_pivot_independent(graph: &Graph, pattern: &PathPattern, symbols: &Symbols) {
    let planned = sorted_paths(graph, pattern, symbols, None);
    for pivot in 0..pattern.len() {
        let forced = sorted_paths(graph, pattern, symbols, Some(pivot));
        assert_eq!(forced, planned, "pivot {} disagrees with the planner", pivot);
    }
}

fn patterns() -> Vec<PathPattern> {
    vec![
        // (a:Person)-[:KNOWS]->(b)-[:WORKS_AT]->(c:Company)
        PathPattern::new(NodePattern::new().named("a").with_label("Person"))
            .then(EdgePattern::outgoing().with_type("KNOWS"), NodePattern::new().named("b"))
            .then(
                EdgePattern::outgoing().with_type("WORKS_AT"),
                NodePattern::new().named("c").with_label("Company"),
            ),
        // (a {group: 1})-[r*1..3]->(b)<-[s {w: 2}]-(c)
        PathPattern::new(NodePattern::new().named("a").with_property("group", 1i64))
            .then(
                EdgePattern::outgoing().named("r").with_length(LengthPattern::range(1, 3)),
                NodePattern::new().named("b"),
            )
            .then(EdgePattern::incoming().named("s").with_property("w", 2i64), NodePattern::new().named("c")),
        // (a)-[:KNOWS]-(b)-[*2]-(a)
        PathPattern::new(NodePattern::new().named("a"))
            .then(EdgePattern::undirected().with_type("KNOWS"), NodePattern::new().named("b"))
            .then(
                EdgePattern::undirected().with_length(LengthPattern::range(2, 2)),
                NodePattern::new().named("a"),
            ),
        // (a:City)<-[*]-(b {group: 0})
        PathPattern::new(NodePattern::new().named("a").with_label("City")).then(
            EdgePattern::incoming().with_length(LengthPattern::unbounded()),
            NodePattern::new().named("b").with_property("group", 0i64),
        ),
    ]
}

#[test]
fn test_every_pivot_yields_the_same_matches() {
    for seed in 0..4 {
        let (graph, _) = random_graph(seed, 12, 24);
        for pattern in patterns() {
            assert_pivot_independent(&graph, &pattern, &Symbols::new());
        }
    }
}

#[test]
fn test_pivot_independent_under_outer_symbols() {
    let (graph, ids) = random_graph(42, 15, 30);
    let mut symbols = Symbols::new();
    symbols.insert("b".to_string(), PatternSymbol::nodes(ids.iter().copied().step_by(2)));
    for pattern in patterns() {
        assert_pivot_independent(&graph, &pattern, &symbols);
    }
}
