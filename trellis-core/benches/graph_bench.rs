use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trellis_core::{Argument, Graph, NodeId, Value};

/// A linear chain: src -> n0 -> n1 -> ... where each node adds 1.0.
fn chain(len: usize) -> (Graph, NodeId, NodeId) {
    let mut graph = Graph::new();
    let src = graph.add_source(Some(Value::Scalar(0.0)));
    let mut last = src;
    for _ in 0..len {
        last = graph
            .add_node(
                |args| Ok(Value::Scalar(args[0].as_scalar().unwrap() + 1.0)),
                vec![Argument::Node(last)],
            )
            .unwrap();
    }
    (graph, src, last)
}

fn bench_cached_read(c: &mut Criterion) {
    let (mut graph, _src, last) = chain(100);
    graph.get_value(last).unwrap();

    c.bench_function("cached_read_chain_100", |b| {
        b.iter(|| black_box(graph.get_value(last).unwrap()))
    });
}

fn bench_source_write(c: &mut Criterion) {
    let (mut graph, src, last) = chain(100);
    graph.get_value(last).unwrap();
    let mut v = 0.0;

    // The write side of the contract: mutation never walks the graph.
    c.bench_function("source_write_chain_100", |b| {
        b.iter(|| {
            v += 1.0;
            graph.set_value(src, Value::Scalar(v)).unwrap();
        })
    });
}

fn bench_mutate_then_read(c: &mut Criterion) {
    let (mut graph, src, last) = chain(100);
    graph.get_value(last).unwrap();
    let mut v = 0.0;

    c.bench_function("mutate_then_read_chain_100", |b| {
        b.iter(|| {
            v += 1.0;
            graph.set_value(src, Value::Scalar(v)).unwrap();
            black_box(graph.get_value(last).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_cached_read,
    bench_source_write,
    bench_mutate_then_read
);
criterion_main!(benches);
