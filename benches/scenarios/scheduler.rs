//! One scheduler frame over a crowded wheel.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyrhythm::{
    config::{SchedulerConfig, SessionDefaults},
    RotationalScheduler, Session, Trigger,
};

fn crowded_session(polygons: usize) -> Session {
    let defaults = SessionDefaults {
        polygons: (0..polygons).map(|i| 3 + i % 30).collect(),
        ..SessionDefaults::default()
    };
    let mut session = Session::from_defaults(&defaults, 120.0).expect("valid defaults");
    let shapes: Vec<_> = session.polygons().iter().map(|p| (p.id(), p.sides())).collect();
    for (id, sides) in shapes {
        for vertex in 0..sides {
            session.set_note_named(id, vertex, "A3").expect("valid note");
        }
    }
    session
}

pub fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/scheduler");

    for &polygons in &[4usize, 16, 64] {
        let mut session = crowded_session(polygons);
        let mut scheduler = RotationalScheduler::new(SchedulerConfig::default());
        scheduler.set_playing(&mut session, true, 0.0);
        let mut triggers: Vec<Trigger> = Vec::with_capacity(4_096);
        let mut now = 0.0;

        group.bench_with_input(BenchmarkId::new("tick", polygons), &polygons, |b, _| {
            b.iter(|| {
                now += 1.0 / 60.0;
                triggers.clear();
                black_box(scheduler.tick(&mut session, now, &mut triggers));
            })
        });
    }

    group.finish();
}
