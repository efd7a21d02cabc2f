use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sutra::graph::{properties, Graph, Label, NodeId, PropertyMap};
use sutra::query::{CountAccumulator, EdgePattern, LengthPattern, NodePattern, PathPattern, Symbols};

/// Chain of `size` Person nodes with KNOWS edges i -> i+1 and i -> i+7
fn social_graph(size: usize, indexed: bool) -> Graph {
    let mut graph = Graph::new();
    if indexed {
        graph.add_node_property_index("name").unwrap();
    }
    let ids: Vec<NodeId> = (0..size)
        .map(|i| {
            graph
                .new_node(["Person"], properties([("name", format!("Person{}", i))]))
                .unwrap()
        })
        .collect();
    for i in 0..size {
        if i + 1 < size {
            graph.new_edge(ids[i], ids[i + 1], "KNOWS", PropertyMap::new()).unwrap();
        }
        if i + 7 < size {
            graph.new_edge(ids[i], ids[i + 7], "KNOWS", PropertyMap::new()).unwrap();
        }
    }
    graph
}

/// Benchmark node insertion throughput
fn bench_node_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_insertion");

    for size in [100, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut graph = Graph::new();
                graph.add_node_property_index("name").unwrap();
                for i in 0..size {
                    graph
                        .new_node(
                            ["Person"],
                            properties([("name", format!("Person{}", i))]),
                        )
                        .unwrap();
                }
                criterion::black_box(graph.node_count());
            });
        });
    }
    group.finish();
}

/// Benchmark property lookup with and without an index
fn bench_property_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_lookup");
    let labels = [Label::new("Person")];

    for size in [1000, 10_000].iter() {
        let target = properties([("name", format!("Person{}", size / 2))]);
        for indexed in [false, true] {
            let graph = social_graph(*size, indexed);
            let id = format!("{}/{}", size, if indexed { "indexed" } else { "scan" });
            group.bench_function(BenchmarkId::from_parameter(id), |b| {
                b.iter(|| {
                    let found = graph.find_nodes(&labels, &target).unwrap().count();
                    criterion::black_box(found);
                });
            });
        }
    }
    group.finish();
}

/// Benchmark single-hop pattern matching
fn bench_single_hop(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_hop");
    let pattern = PathPattern::new(NodePattern::new().named("a").with_label("Person"))
        .then(EdgePattern::outgoing().with_type("KNOWS"), NodePattern::new().named("b"));

    for size in [100, 1000, 10_000].iter() {
        let graph = social_graph(*size, false);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut count = CountAccumulator::new();
                pattern.run(&graph, &Symbols::new(), &mut count).unwrap();
                criterion::black_box(count.count());
            });
        });
    }
    group.finish();
}

/// Benchmark variable-length expansion from an indexed start node
fn bench_variable_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("variable_length");
    let graph = social_graph(1000, true);

    for max in [2, 4, 6].iter() {
        let pattern = PathPattern::new(NodePattern::new().with_property("name", "Person0")).then(
            EdgePattern::outgoing()
                .with_type("KNOWS")
                .with_length(LengthPattern::range(1, *max)),
            NodePattern::new().named("b"),
        );
        group.bench_with_input(BenchmarkId::from_parameter(max), max, |b, _| {
            b.iter(|| {
                let mut count = CountAccumulator::new();
                pattern.run(&graph, &Symbols::new(), &mut count).unwrap();
                criterion::black_box(count.count());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_node_insertion,
    bench_property_lookup,
    bench_single_hop,
    bench_variable_length
);
criterion_main!(benches);
