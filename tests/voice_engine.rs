//! Envelope planning laws and the engine driven by the scheduler, rendered
//! through the offline backend.

use proptest::prelude::*;

use polyrhythm::{
    config::{EngineConfig, SchedulerConfig, SessionDefaults},
    synth::{config::EnvelopeSettings, EnvelopeSchedule, OfflineBackend},
    RotationalScheduler, Session, SynthConfig, VoiceEngine,
};

const SAMPLE_RATE: f32 = 16_000.0;

proptest! {
    #[test]
    fn envelope_phases_are_ordered(
        start in 0.0f64..1_000.0,
        duration in 0.001f64..5.0,
        attack in 0.0f64..2.0,
        decay in 0.0f64..2.0,
        sustain in 0.0f32..=1.0,
        release in 0.0f64..3.0,
        peak in 0.0f32..=1.0,
    ) {
        let settings = EnvelopeSettings { attack, decay, sustain, release };
        let plan = EnvelopeSchedule::plan(start, duration, &settings, peak, 0.05).unwrap();

        prop_assert!(plan.is_ordered());
        prop_assert_eq!(plan.compressed, attack + decay >= duration);
        prop_assert!((plan.end - (start + duration)).abs() < 1e-9);

        let automation = plan.automation();
        prop_assert_eq!(automation.level_at(automation.end_time()), 0.0);
        prop_assert_eq!(automation.level_at(automation.end_time() + 0.05), 0.0);
        for step in 0..=20 {
            let level = automation.level_at(duration * step as f64 / 20.0);
            prop_assert!((0.0..=peak + 1e-6).contains(&level));
        }
    }

    #[test]
    fn compressed_envelopes_fade_linearly(duration in 0.01f64..1.0, extra in 0.0f64..1.0) {
        let settings = EnvelopeSettings { attack: duration + extra, decay: 0.1, sustain: 0.5, release: 0.2 };
        let plan = EnvelopeSchedule::plan(0.0, duration, &settings, 1.0, 0.05).unwrap();
        prop_assert!(plan.compressed);
        let halfway = plan.automation().level_at(duration / 2.0);
        prop_assert!((halfway - 0.5).abs() < 0.01);
    }
}

fn engine() -> VoiceEngine<OfflineBackend> {
    let config = EngineConfig {
        sample_rate: SAMPLE_RATE,
        ..EngineConfig::default()
    };
    VoiceEngine::new(OfflineBackend::new(SAMPLE_RATE, 32, 0.8), config)
}

fn session() -> Session {
    let mut session = Session::from_defaults(&SessionDefaults::default(), 60.0).unwrap();
    let ids: Vec<_> = session.polygons().iter().map(|p| p.id()).collect();
    session.set_note_named(ids[0], 0, "C4").unwrap();
    session.set_note_named(ids[0], 1, "E4").unwrap();
    session.set_note_named(ids[1], 2, "G3").unwrap();
    session
        .set_synth(ids[1], SynthConfig::default().with_note_duration(0.2))
        .unwrap();
    session
}

/// Advance scheduler and audio together in 1/60 s frames.
fn play(seconds: f64, session: &mut Session, scheduler: &mut RotationalScheduler, engine: &mut VoiceEngine<OfflineBackend>) -> Vec<f32> {
    let frame = (SAMPLE_RATE / 60.0).round() as usize;
    let mut audio = Vec::new();
    let mut block = vec![0.0f32; frame];
    let frames = (seconds * 60.0).round() as usize;
    for _ in 0..frames {
        let now = engine.backend().mixer().time();
        scheduler.tick(session, now, engine);
        engine.collect();
        engine.backend_mut().render(&mut block);
        audio.extend_from_slice(&block);
    }
    audio
}

#[test]
fn scheduled_triggers_become_audible_voices() {
    let mut session = session();
    let mut scheduler = RotationalScheduler::new(SchedulerConfig::default());
    let mut engine = engine();
    scheduler.set_playing(&mut session, true, 0.0);

    let audio = play(1.0, &mut session, &mut scheduler, &mut engine);

    let peak = audio.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!(peak > 0.05, "peak {peak}");
    assert!(audio.iter().all(|s| s.is_finite() && s.abs() <= 1.5));
}

#[test]
fn registry_drains_after_playback_stops() {
    let mut session = session();
    let mut scheduler = RotationalScheduler::new(SchedulerConfig::default());
    let mut engine = engine();
    scheduler.set_playing(&mut session, true, 0.0);

    play(0.5, &mut session, &mut scheduler, &mut engine);
    assert!(engine.live_count() > 0);

    let now = engine.backend().mixer().time();
    scheduler.set_playing(&mut session, false, now);
    // paused: no new triggers, scheduled voices play out
    play(2.0, &mut session, &mut scheduler, &mut engine);
    assert_eq!(engine.live_count(), 0);
    assert_eq!(engine.backend().mixer().active_voices(), 0);
}

#[test]
fn stop_all_empties_registry_and_silences() {
    let mut session = session();
    let mut scheduler = RotationalScheduler::new(SchedulerConfig::default());
    let mut engine = engine();
    scheduler.set_playing(&mut session, true, 0.0);
    play(0.1, &mut session, &mut scheduler, &mut engine);
    scheduler.set_playing(&mut session, false, engine.backend().mixer().time());

    engine.stop_all_voices();
    assert_eq!(engine.live_count(), 0);
    let tail = engine.backend_mut().render_seconds(0.1);
    assert!(tail.iter().all(|s| *s == 0.0));

    // nothing registered: a no-op
    assert_eq!(engine.stop_all_voices(), 0);
}

#[test]
fn disabled_polygon_voice_stays_silent() {
    let mut session = session();
    let ids: Vec<_> = session.polygons().iter().map(|p| p.id()).collect();
    for id in ids {
        session.set_synth(id, SynthConfig::default().disabled()).unwrap();
    }
    let mut scheduler = RotationalScheduler::new(SchedulerConfig::default());
    let mut engine = engine();
    scheduler.set_playing(&mut session, true, 0.0);

    let audio = play(1.0, &mut session, &mut scheduler, &mut engine);
    assert!(audio.iter().all(|s| *s == 0.0));
    assert_eq!(engine.live_count(), 0);
}
