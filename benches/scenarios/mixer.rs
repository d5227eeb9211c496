//! A full mixer of planned voices, rendered block by block.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyrhythm::{
    synth::{build_voice_graph, EnvelopeSchedule, ScheduledVoice, VoiceId, VoiceMixer},
    SynthConfig,
};

use crate::BLOCK_SIZES;

const VOICES: usize = 32;

fn loaded_mixer() -> VoiceMixer {
    let config = SynthConfig::default();
    let graph = build_voice_graph(&config).expect("enabled voice");
    let mut mixer = VoiceMixer::new(48_000.0, VOICES, 0.8);
    for i in 0..VOICES {
        let schedule = EnvelopeSchedule::plan(0.0, 1_000.0, &config.envelope, 0.3, 0.05).expect("valid duration");
        mixer.start(
            VoiceId(i as u64),
            ScheduledVoice {
                start_time: schedule.start,
                stop_time: schedule.stop_at,
                frequency: 110.0 * (1.0 + i as f32 * 0.25),
                velocity: 1.0,
                graph: graph.instantiate(48_000.0, schedule.automation()),
            },
        );
    }
    mixer
}

pub fn bench_mixer(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/mixer");

    for &size in BLOCK_SIZES {
        let mut mixer = loaded_mixer();
        let mut buffer = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("32_voices", size), &size, |b, _| {
            b.iter(|| {
                mixer.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
