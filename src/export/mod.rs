//! Note lists for exporters (MIDI writers, notation, analysis).
//!
//! Events are computed analytically from the session instead of by running
//! the scheduler: the playhead starts at angle 0 at time 0 and turns at the
//! session's RPM, so vertex `v` of an `n`-gon sounds at
//!
//! ```text
//! t = (360·v/n + 360·k) / (rpm × 6)      for k = 0, 1, 2, …
//! ```
//!
//! which is exactly what a reset-then-play run of the scheduler fires,
//! without frame quantization.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    model::{playhead::seconds_per_revolution, PolygonId, Session},
    scale::Pitch,
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// Seconds from the start of the first revolution.
    pub time: f64,
    pub polygon: PolygonId,
    pub vertex: usize,
    pub pitch: Pitch,
    pub midi_note: u8,
    pub duration: f64,
    /// The polygon's voice volume, 0.0..=1.0.
    pub velocity: f32,
}

/// Every note `revolutions` turns of the playhead would play, sorted by time,
/// then polygon order, then vertex. `note_duration` overrides each polygon's
/// own setting. Inactive polygons, empty vertices and disabled voices are
/// skipped; an unusable RPM or revolution count yields nothing.
pub fn note_events(session: &Session, revolutions: f64, note_duration: Option<f64>) -> Vec<NoteEvent> {
    let Some(period) = seconds_per_revolution(session.playhead().rpm()) else {
        return Vec::new();
    };
    if !(revolutions.is_finite() && revolutions > 0.0) {
        return Vec::new();
    }
    let total = revolutions * period;
    let whole_turns = revolutions.ceil() as usize;

    let mut events = Vec::new();
    for (order, polygon) in session.polygons().iter().enumerate() {
        if !polygon.is_active() || !polygon.synth().enabled {
            continue;
        }
        let duration = note_duration.unwrap_or(polygon.synth().note_duration);
        for (vertex, pitch) in polygon.filled_vertices() {
            let offset = polygon.vertex_angle(vertex) / 360.0 * period;
            for turn in 0..whole_turns {
                let time = offset + turn as f64 * period;
                if time >= total {
                    break;
                }
                events.push((
                    order,
                    NoteEvent {
                        time,
                        polygon: polygon.id(),
                        vertex,
                        pitch,
                        midi_note: pitch.midi(),
                        duration,
                        velocity: polygon.synth().volume,
                    },
                ));
            }
        }
    }

    events.sort_by(|(order_a, a), (order_b, b)| {
        a.time
            .total_cmp(&b.time)
            .then(order_a.cmp(order_b))
            .then(a.vertex.cmp(&b.vertex))
    });
    events.into_iter().map(|(_, event)| event).collect()
}
