//! Criterion benchmarks for the confluence-core audio graph.
//!
//! Two axes:
//!
//! - **Edit**: connect + publish cost (cycle check, Kahn sort, snapshot swap)
//! - **Execute**: one processing pass at varying block sizes and fan-in
//!
//! Run with: `cargo bench -p confluence-core -- graph/`
#![allow(missing_docs)]

use std::sync::Arc;

use confluence_core::{AudioGraph, Settings, SumNode, SystemSource, SystemTarget};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const SAMPLE_RATE: u32 = 48_000;
const BLOCK_SIZE: usize = 256;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

// ---------------------------------------------------------------------------
// Graph constructors
// ---------------------------------------------------------------------------

/// `n` sources mixed by one sum node into one target.
fn make_mix(
    n: usize,
    block_size: usize,
) -> (AudioGraph, Vec<Arc<SystemSource>>, Arc<SystemTarget>) {
    let graph = AudioGraph::new(Settings::new(block_size, SAMPLE_RATE).unwrap());
    let sum = graph.create_sum(None).unwrap();
    let sources: Vec<_> = (0..n)
        .map(|i| {
            let src = graph.create_system_source(None).unwrap();
            let port = sum.create_port_target(format!("in{i}")).unwrap();
            graph.connect_audio(src.port(), &port).unwrap();
            src
        })
        .collect();
    let out = graph.create_system_target(None).unwrap();
    graph.connect_audio(sum.source_port(), out.port()).unwrap();
    (graph, sources, out)
}

/// A linear chain of `n` single-input sum nodes.
fn make_chain(n: usize, graph: &AudioGraph) -> Vec<Arc<SumNode>> {
    let nodes: Vec<_> = (0..n).map(|_| graph.create_sum(None).unwrap()).collect();
    for pair in nodes.windows(2) {
        let port = pair[1].create_port_target("in").unwrap();
        graph.connect_audio(pair[0].source_port(), &port).unwrap();
    }
    nodes
}

// ---------------------------------------------------------------------------
// Edit benchmarks
// ---------------------------------------------------------------------------

fn bench_edit(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/edit");

    for &n in &[5usize, 20, 100] {
        group.bench_with_input(BenchmarkId::new("chain_build", n), &n, |b, &n| {
            b.iter(|| {
                let graph = AudioGraph::new(Settings::new(BLOCK_SIZE, SAMPLE_RATE).unwrap());
                black_box(make_chain(n, &graph));
            });
        });
    }

    // Toggle one edge at the end of a 50-node chain: cycle check + republish.
    {
        let graph = AudioGraph::new(Settings::new(BLOCK_SIZE, SAMPLE_RATE).unwrap());
        let chain = make_chain(50, &graph);
        let tail = graph.create_system_target(None).unwrap();
        let last = chain.last().unwrap();
        group.bench_function("toggle_edge_chain_50", |b| {
            b.iter(|| {
                graph.connect_audio(last.source_port(), tail.port()).unwrap();
                graph.disconnect_audio(last.source_port(), tail.port()).unwrap();
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Execute benchmarks
// ---------------------------------------------------------------------------

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/execute");
    let input = vec![0.5f32; BLOCK_SIZE];
    let mut output = vec![0.0f32; BLOCK_SIZE];

    for &n in &[1usize, 4, 16] {
        let (graph, sources, out) = make_mix(n, BLOCK_SIZE);
        group.bench_function(format!("mix_{n}_block256"), |b| {
            b.iter(|| {
                graph.execute(|ctx| {
                    for src in &sources {
                        src.port().copy_in(black_box(input.as_slice()));
                    }
                    ctx.process();
                    out.port().copy_out(output.as_mut_slice());
                });
                black_box(&output);
            });
        });
    }

    {
        let graph = AudioGraph::new(Settings::new(BLOCK_SIZE, SAMPLE_RATE).unwrap());
        make_chain(20, &graph);
        group.bench_function("chain_20_block256", |b| {
            b.iter(|| graph.execute(|ctx| ctx.process()));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Block size sweep: 4-input mix across standard block sizes
// ---------------------------------------------------------------------------

fn bench_block_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/block_sweep");

    for &block_size in BLOCK_SIZES {
        let input = vec![0.5f32; block_size];
        let mut output = vec![0.0f32; block_size];
        let (graph, sources, out) = make_mix(4, block_size);

        group.bench_with_input(
            BenchmarkId::new("mix_4", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    graph.execute(|ctx| {
                        for src in &sources {
                            src.port().copy_in(black_box(input.as_slice()));
                        }
                        ctx.process();
                        out.port().copy_out(output.as_mut_slice());
                    });
                    black_box(&output);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_edit, bench_execute, bench_block_sweep);
criterion_main!(benches);
