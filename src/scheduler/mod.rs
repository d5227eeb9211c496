//! Rotational scheduler: turns elapsed time into playhead travel and vertex
//! crossings into note triggers.
//!
//! The host calls [`RotationalScheduler::tick`] once per frame with a
//! monotonic clock in seconds. Everything the user can do to the transport
//! (play, pause, change speed, drag the playhead, reset) goes through the
//! scheduler too, so it can keep the angle continuous and decide which
//! vertices the next sweep covers.

pub mod crossing;
pub mod retrigger;
pub mod transport;

use tracing::{debug, info};

use crate::{
    config::SchedulerConfig,
    error::{PolyError, PolyResult},
    model::{normalize_angle, AngleSource, PolygonId, Session},
    scale::Pitch,
    synth::config::SynthConfig,
};

use self::{
    crossing::crossed_vertices,
    retrigger::RetriggerGuard,
    transport::{Transport, TransportState},
};

/// One vertex crossing that passed the retrigger guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub polygon: PolygonId,
    pub vertex: usize,
    pub pitch: Pitch,
    /// Scheduler clock at the frame that detected the crossing.
    pub time: f64,
}

/// Receives triggers in firing order: polygon list order, then vertex index.
pub trait TriggerSink {
    fn on_trigger(&mut self, trigger: Trigger, synth: &SynthConfig);
}

/// Records triggers; handy for tests and offline analysis.
impl TriggerSink for Vec<Trigger> {
    fn on_trigger(&mut self, trigger: Trigger, _synth: &SynthConfig) {
        self.push(trigger);
    }
}

pub struct RotationalScheduler {
    config: SchedulerConfig,
    state: TransportState,
    transport: Transport,
    /// Travel published at the end of the last tick.
    last_travel: f64,
    guard: RetriggerGuard,
}

impl RotationalScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            state: TransportState::Stopped,
            transport: Transport::default(),
            last_travel: 0.0,
            guard: RetriggerGuard::new(),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Advance to `now`, fire crossed vertices into `sink`, publish the new
    /// angle. Returns how many triggers fired.
    pub fn tick<S: TriggerSink + ?Sized>(&mut self, session: &mut Session, now: f64, sink: &mut S) -> usize {
        self.guard.retain_live(|id, vertex, pitch| {
            session
                .polygon(id)
                .is_some_and(|polygon| polygon.note(vertex) == Some(pitch))
        });

        let rpm = session.playhead().rpm();
        if let TransportState::ManualJump { until, resume } = self.state {
            if now < until {
                return 0;
            }
            if resume {
                self.state = TransportState::Playing;
                self.transport.set_running(true, now, rpm);
            } else {
                self.state = TransportState::Stopped;
            }
            debug!(resume, "manual jump cooldown over");
        }

        if !self.state.is_playing() {
            return 0;
        }

        let prev = self.last_travel;
        let next = self.transport.travel(now, rpm);
        let include_start = self.transport.includes_start(prev);
        let active = session.active_polygon_count();

        let mut fired = 0;
        for polygon in session.polygons().iter().filter(|p| p.is_active()) {
            for vertex in crossed_vertices(polygon.sides(), prev, next, include_start) {
                let Some(pitch) = polygon.note(vertex) else {
                    continue;
                };
                if !self.guard.admit(polygon.id(), vertex, pitch, now, rpm, active) {
                    debug!(polygon = %polygon.id(), vertex, "retrigger suppressed");
                    continue;
                }
                let trigger = Trigger {
                    polygon: polygon.id(),
                    vertex,
                    pitch,
                    time: now,
                };
                sink.on_trigger(trigger, polygon.synth());
                fired += 1;
            }
        }

        self.transport.mark_swept(next);
        self.last_travel = next;
        session
            .playhead_mut()
            .set_angle(next, AngleSource::Scheduler);
        fired
    }

    /// Change speed without moving the playhead. Out-of-range values are
    /// rejected and the previous speed is kept.
    pub fn set_rpm(&mut self, session: &mut Session, rpm: f64, now: f64) -> PolyResult<()> {
        let (min, max) = (self.config.min_rpm, self.config.max_rpm);
        let current = session.playhead().rpm();
        self.transport.reanchor(now, current);
        session.playhead_mut().set_rpm(rpm, min, max)?;
        info!(rpm, "rpm changed");
        Ok(())
    }

    pub fn set_playing(&mut self, session: &mut Session, playing: bool, now: f64) {
        let rpm = session.playhead().rpm();
        match (self.state, playing) {
            (TransportState::Stopped, true) => {
                self.state = TransportState::Playing;
                self.transport.set_running(true, now, rpm);
                info!(angle = session.playhead().angle(), "playback started");
            }
            (TransportState::Playing, false) => {
                self.state = TransportState::Stopped;
                self.transport.pause_at(self.last_travel, now);
                info!(angle = session.playhead().angle(), "playback paused");
            }
            (TransportState::ManualJump { until, .. }, resume) => {
                self.state = TransportState::ManualJump { until, resume };
            }
            _ => {}
        }
        session.playhead_mut().set_playing(playing);
    }

    pub fn toggle_playing(&mut self, session: &mut Session, now: f64) {
        let playing = !self.state.wants_playback();
        self.set_playing(session, playing, now);
    }

    /// Move the playhead to `angle` degrees.
    ///
    /// A manual jump while playing holds the playhead still for the
    /// configured cooldown and then resumes from the new position, sounding
    /// the vertex it landed on. A non-manual move just re-anchors: nothing
    /// between the old and the new angle fires.
    pub fn set_angle(&mut self, session: &mut Session, angle: f64, manual: bool, now: f64) -> PolyResult<()> {
        if !angle.is_finite() {
            return Err(PolyError::config("angle", format!("{angle} is not a finite angle")));
        }
        let travel = normalize_angle(angle);

        if manual {
            if self.state.wants_playback() {
                self.state = TransportState::ManualJump {
                    until: now + self.config.manual_jump_cooldown,
                    resume: true,
                };
            }
            self.transport.pause_at(travel, now);
            self.transport.jump_to(travel, now, true);
            session
                .playhead_mut()
                .set_angle(travel, AngleSource::ManualJump);
            debug!(angle = travel, state = ?self.state, "manual jump");
        } else {
            self.transport.jump_to(travel, now, false);
            session.playhead_mut().set_angle(travel, AngleSource::Direct);
        }
        self.last_travel = travel;
        Ok(())
    }

    /// Back to angle 0 with a clean trigger history. Playback state is kept;
    /// a pending manual jump resolves immediately.
    pub fn reset(&mut self, session: &mut Session, now: f64) {
        let rpm = session.playhead().rpm();
        let playing = self.state.wants_playback();
        self.state = if playing {
            TransportState::Playing
        } else {
            TransportState::Stopped
        };

        self.transport.jump_to(0.0, now, true);
        self.transport.set_running(playing, now, rpm);
        self.last_travel = 0.0;
        self.guard.clear();
        session.playhead_mut().set_angle(0.0, AngleSource::Reset);
        session.playhead_mut().set_playing(playing);
        info!("playhead reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionDefaults;

    fn setup(rpm: f64) -> (RotationalScheduler, Session) {
        let defaults = SessionDefaults {
            polygons: vec![4],
            ..SessionDefaults::default()
        };
        let mut session = Session::from_defaults(&defaults, rpm).unwrap();
        let id = session.polygons()[0].id();
        for vertex in 0..4 {
            session.set_note_named(id, vertex, "C4").unwrap();
        }
        (RotationalScheduler::new(SchedulerConfig::default()), session)
    }

    #[test]
    fn first_play_sounds_vertex_under_playhead() {
        let (mut scheduler, mut session) = setup(60.0);
        let mut triggers = Vec::new();
        scheduler.set_playing(&mut session, true, 0.0);
        scheduler.tick(&mut session, 0.0, &mut triggers);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].vertex, 0);
    }

    #[test]
    fn history_follows_note_edits() {
        let (mut scheduler, mut session) = setup(60.0);
        let id = session.polygons()[0].id();
        let mut triggers = Vec::new();
        scheduler.set_playing(&mut session, true, 0.0);
        for frame in 0..=60 {
            scheduler.tick(&mut session, frame as f64 / 60.0, &mut triggers);
        }
        assert_eq!(scheduler.guard.len(), 4);

        for (vertex, name) in ["D4", "E4", "F4"].into_iter().enumerate() {
            session.set_note_named(id, vertex, name).unwrap();
        }
        session.clear_note(id, 3).unwrap();
        assert_eq!(scheduler.tick(&mut session, 61.0 / 60.0, &mut triggers), 0);
        assert!(scheduler.guard.is_empty());
    }

    #[test]
    fn stopped_scheduler_does_nothing() {
        let (mut scheduler, mut session) = setup(60.0);
        let mut triggers = Vec::new();
        assert_eq!(scheduler.tick(&mut session, 5.0, &mut triggers), 0);
        assert_eq!(session.playhead().angle(), 0.0);
    }

    #[test]
    fn angle_follows_rpm() {
        let (mut scheduler, mut session) = setup(60.0);
        let mut triggers = Vec::new();
        scheduler.set_playing(&mut session, true, 10.0);
        scheduler.tick(&mut session, 10.25, &mut triggers);
        assert!((session.playhead().angle() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn pause_and_resume_does_not_refire_resting_vertex() {
        let (mut scheduler, mut session) = setup(60.0);
        let mut triggers = Vec::new();
        scheduler.set_playing(&mut session, true, 0.0);
        scheduler.tick(&mut session, 0.0, &mut triggers);
        scheduler.tick(&mut session, 0.25, &mut triggers); // lands exactly on vertex 1
        assert_eq!(triggers.len(), 2);

        scheduler.set_playing(&mut session, false, 0.3);
        scheduler.set_playing(&mut session, true, 5.0);
        scheduler.tick(&mut session, 5.01, &mut triggers);
        assert_eq!(triggers.len(), 2);
    }

    #[test]
    fn rejected_rpm_keeps_phase_and_speed() {
        let (mut scheduler, mut session) = setup(60.0);
        scheduler.set_playing(&mut session, true, 0.0);
        assert!(scheduler.set_rpm(&mut session, -1.0, 0.1).is_err());
        assert_eq!(session.playhead().rpm(), 60.0);

        let mut triggers = Vec::new();
        scheduler.tick(&mut session, 0.2, &mut triggers);
        assert!((session.playhead().angle() - 72.0).abs() < 1e-9);
    }

    #[test]
    fn manual_jump_holds_then_resumes() {
        let (mut scheduler, mut session) = setup(60.0);
        let mut triggers = Vec::new();
        scheduler.set_playing(&mut session, true, 0.0);
        scheduler.tick(&mut session, 0.1, &mut triggers);
        triggers.clear();

        scheduler.set_angle(&mut session, 180.0, true, 0.1).unwrap();
        assert!(matches!(scheduler.state(), TransportState::ManualJump { resume: true, .. }));

        scheduler.tick(&mut session, 0.3, &mut triggers);
        assert!(triggers.is_empty());
        assert_eq!(session.playhead().angle(), 180.0);

        // cooldown over: vertex 2 (180°) sounds on the first sweep
        scheduler.tick(&mut session, 0.65, &mut triggers);
        assert_eq!(scheduler.state(), TransportState::Playing);
        assert_eq!(triggers.iter().map(|t| t.vertex).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn pausing_during_jump_ends_stopped() {
        let (mut scheduler, mut session) = setup(60.0);
        let mut triggers = Vec::new();
        scheduler.set_playing(&mut session, true, 0.0);
        scheduler.set_angle(&mut session, 45.0, true, 0.0).unwrap();
        scheduler.set_playing(&mut session, false, 0.1);

        scheduler.tick(&mut session, 1.0, &mut triggers);
        assert_eq!(scheduler.state(), TransportState::Stopped);
        assert!(!session.playhead().is_playing());
    }

    #[test]
    fn manual_jump_while_stopped_only_moves() {
        let (mut scheduler, mut session) = setup(60.0);
        scheduler.set_angle(&mut session, 270.0, true, 0.0).unwrap();
        assert_eq!(scheduler.state(), TransportState::Stopped);
        assert_eq!(session.playhead().angle(), 270.0);
    }

    #[test]
    fn direct_set_angle_skips_intermediate_vertices() {
        let (mut scheduler, mut session) = setup(60.0);
        let mut triggers = Vec::new();
        scheduler.set_playing(&mut session, true, 0.0);
        scheduler.tick(&mut session, 0.01, &mut triggers);
        triggers.clear();

        scheduler.set_angle(&mut session, 200.0, false, 0.02).unwrap();
        assert_eq!(scheduler.state(), TransportState::Playing);
        scheduler.tick(&mut session, 0.03, &mut triggers);
        assert!(triggers.is_empty(), "nothing between 3.6° and 203.6° may fire");
    }

    #[test]
    fn reset_returns_to_zero_and_refires_vertex_zero() {
        let (mut scheduler, mut session) = setup(60.0);
        let mut triggers = Vec::new();
        scheduler.set_playing(&mut session, true, 0.0);
        scheduler.tick(&mut session, 0.0, &mut triggers);
        scheduler.tick(&mut session, 0.1, &mut triggers);

        scheduler.reset(&mut session, 0.1);
        assert_eq!(session.playhead().angle(), 0.0);
        scheduler.tick(&mut session, 0.1, &mut triggers);
        assert_eq!(triggers.iter().filter(|t| t.vertex == 0).count(), 2);
    }

    #[test]
    fn inactive_polygons_never_fire() {
        let (mut scheduler, mut session) = setup(60.0);
        let id = session.polygons()[0].id();
        session.set_active(id, false).unwrap();

        let mut triggers = Vec::new();
        scheduler.set_playing(&mut session, true, 0.0);
        for frame in 0..120 {
            scheduler.tick(&mut session, frame as f64 / 60.0, &mut triggers);
        }
        assert!(triggers.is_empty());
    }

    #[test]
    fn non_finite_angle_is_rejected() {
        let (mut scheduler, mut session) = setup(60.0);
        assert!(scheduler.set_angle(&mut session, f64::NAN, true, 0.0).is_err());
    }
}
