use std::collections::HashMap;

use crate::{model::PolygonId, scale::Pitch};

/// Fraction of a revolution that must pass before the same vertex may sound
/// again: `0.2 + 0.05` per active polygon, capped at half a turn.
#[inline]
pub fn guard_fraction(active_polygons: usize) -> f64 {
    (0.2 + 0.05 * active_polygons as f64).min(0.5)
}

/// Minimum seconds between two triggers of the same vertex.
///
/// Measured against the faster of the current RPM and the RPM at the last
/// trigger, so a slow-down never stretches the window past one revolution
/// at the new speed.
pub fn min_interval(rpm_now: f64, rpm_at_last: f64, active_polygons: usize) -> f64 {
    let rpm = rpm_now.max(rpm_at_last);
    if !(rpm.is_finite() && rpm > 0.0) {
        return 0.0;
    }
    60.0 / rpm * guard_fraction(active_polygons)
}

#[derive(Debug, Clone, Copy)]
struct LastTrigger {
    time: f64,
    rpm: f64,
}

type TriggerKey = (PolygonId, usize, Pitch);

/// Per (polygon, vertex, pitch) trigger history.
#[derive(Debug, Default)]
pub struct RetriggerGuard {
    history: HashMap<TriggerKey, LastTrigger>,
}

impl RetriggerGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trigger at `now` if it is not too close to the previous one.
    /// Returns whether the trigger may sound.
    pub fn admit(
        &mut self,
        polygon: PolygonId,
        vertex: usize,
        pitch: Pitch,
        now: f64,
        rpm: f64,
        active_polygons: usize,
    ) -> bool {
        let key = (polygon, vertex, pitch);
        if let Some(last) = self.history.get(&key) {
            let elapsed = now - last.time;
            if elapsed >= 0.0 && elapsed < min_interval(rpm, last.rpm, active_polygons) {
                return false;
            }
        }
        self.history.insert(key, LastTrigger { time: now, rpm });
        true
    }

    /// Keep only entries `live` still recognises: the polygon exists and the
    /// vertex still carries that pitch. Removed polygons, cleared vertices
    /// and replaced notes all drop out, so the map tracks the session
    /// instead of every note ever placed.
    pub fn retain_live(&mut self, live: impl Fn(PolygonId, usize, Pitch) -> bool) {
        self.history
            .retain(|&(id, vertex, pitch), _| live(id, vertex, pitch));
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
