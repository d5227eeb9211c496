//! Benchmarks for each synthesis method's source node.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyrhythm::graph::{
    oscillator::OscNode,
    sources::{AdditiveNode, FmNode, GranularNode, SourceNode, WavetableNode},
    GraphNode, RenderCtx,
};

use crate::BLOCK_SIZES;

fn sources() -> Vec<(&'static str, SourceNode)> {
    vec![
        ("oscillator", SourceNode::Oscillator(OscNode::sawtooth())),
        ("additive", SourceNode::Additive(AdditiveNode::new(16))),
        ("wavetable", SourceNode::Wavetable(WavetableNode::new(0.5))),
        ("fm", SourceNode::Fm(FmNode::new(2.0, 3.0))),
        ("granular", SourceNode::Granular(GranularNode::new(0.04, 80.0))),
    ]
}

pub fn bench_sources(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/sources");
    let ctx = RenderCtx::from_freq(48_000.0, 220.0, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        for (name, mut source) in sources() {
            source.note_on(&ctx);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    source.render_block(black_box(&mut buffer), black_box(&ctx));
                })
            });
        }
    }

    group.finish();
}
