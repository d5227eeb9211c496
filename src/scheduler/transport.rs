/// Where the playhead clock is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportState {
    Stopped,
    Playing,
    /// The user moved the playhead while playing. Nothing advances until
    /// `until`; then playback resumes if `resume` is still set.
    ManualJump { until: f64, resume: bool },
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    /// Playing, or will resume playing after a jump.
    pub fn wants_playback(&self) -> bool {
        match self {
            TransportState::Stopped => false,
            TransportState::Playing => true,
            TransportState::ManualJump { resume, .. } => *resume,
        }
    }
}

/// Unwrapped travel as a function of time.
///
/// `travel(now) = anchor_travel + (now - anchor_time) × rpm × 6` while
/// running; frozen at `anchor_travel` otherwise. Every RPM change, pause,
/// resume or jump re-anchors at the current travel, so the angle never
/// jumps when the speed changes.
#[derive(Debug, Clone, Copy)]
pub struct Transport {
    anchor_time: f64,
    anchor_travel: f64,
    /// Travel at the right end of the last sweep, if the next sweep should
    /// exclude it.
    swept_to: Option<f64>,
    running: bool,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            anchor_time: 0.0,
            anchor_travel: 0.0,
            swept_to: None,
            running: false,
        }
    }
}

/// Degrees per second at `rpm`. Zero for anything that cannot advance.
#[inline]
pub fn degrees_per_second(rpm: f64) -> f64 {
    if rpm.is_finite() && rpm > 0.0 {
        rpm * 6.0
    } else {
        0.0
    }
}

impl Transport {
    pub fn travel(&self, now: f64, rpm: f64) -> f64 {
        if !self.running {
            return self.anchor_travel;
        }
        let elapsed = (now - self.anchor_time).max(0.0);
        self.anchor_travel + elapsed * degrees_per_second(rpm)
    }

    /// Freeze or unfreeze at the current position.
    pub fn set_running(&mut self, running: bool, now: f64, rpm: f64) {
        self.anchor_travel = self.travel(now, rpm);
        self.anchor_time = now;
        self.running = running;
    }

    /// Keep position, restart the clock (before an RPM change).
    pub fn reanchor(&mut self, now: f64, rpm: f64) {
        let running = self.running;
        self.set_running(running, now, rpm);
    }

    /// Stop at `travel` (the last published position) without touching the
    /// swept marker.
    pub fn pause_at(&mut self, travel: f64, now: f64) {
        self.anchor_travel = travel;
        self.anchor_time = now;
        self.running = false;
    }

    /// Teleport to `travel`. With `fresh` the next sweep includes the new
    /// position itself; otherwise the position counts as already swept.
    pub fn jump_to(&mut self, travel: f64, now: f64, fresh: bool) {
        self.anchor_travel = travel;
        self.anchor_time = now;
        self.swept_to = if fresh { None } else { Some(travel) };
    }

    /// Whether a sweep starting at `prev` should include `prev`.
    pub fn includes_start(&self, prev: f64) -> bool {
        self.swept_to != Some(prev)
    }

    pub fn mark_swept(&mut self, travel: f64) {
        self.swept_to = Some(travel);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
