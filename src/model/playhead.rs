#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PolyError, PolyResult};

/// Who moved the playhead last.
///
/// The scheduler needs to tell its own per-frame advance apart from a user
/// grabbing the wheel, so every angle write carries its origin.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleSource {
    /// Per-frame advance while playing.
    #[default]
    Scheduler,
    /// Drag or arrow-key jump.
    ManualJump,
    /// Programmatic re-position that should not count as a jump.
    Direct,
    Reset,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Playhead {
    angle: f64,
    playing: bool,
    rpm: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    last_source: AngleSource,
}

impl Default for Playhead {
    fn default() -> Self {
        Self::new(30.0)
    }
}

/// Fold any finite angle into [0, 360).
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

impl Playhead {
    pub fn new(rpm: f64) -> Self {
        Self {
            angle: 0.0,
            playing: false,
            rpm,
            last_source: AngleSource::Reset,
        }
    }

    /// Degrees, always in [0, 360).
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn last_source(&self) -> AngleSource {
        self.last_source
    }

    /// Non-finite angles are ignored.
    pub fn set_angle(&mut self, angle: f64, source: AngleSource) {
        if !angle.is_finite() {
            return;
        }
        self.angle = normalize_angle(angle);
        self.last_source = source;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    /// Accept `rpm` if it is finite and inside `min..=max`; otherwise keep
    /// the current value and report why.
    pub fn set_rpm(&mut self, rpm: f64, min: f64, max: f64) -> PolyResult<()> {
        if !rpm.is_finite() || rpm <= 0.0 || rpm < min || rpm > max {
            return Err(PolyError::InvalidRpm { rpm, min, max });
        }
        self.rpm = rpm;
        Ok(())
    }

    /// Seconds for one full turn, `None` if the RPM cannot advance.
    pub fn seconds_per_revolution(&self) -> Option<f64> {
        seconds_per_revolution(self.rpm)
    }
}

#[inline]
pub fn seconds_per_revolution(rpm: f64) -> Option<f64> {
    (rpm.is_finite() && rpm > 0.0).then(|| 60.0 / rpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_is_normalized() {
        let mut playhead = Playhead::default();
        playhead.set_angle(725.0, AngleSource::Direct);
        assert_eq!(playhead.angle(), 5.0);
        playhead.set_angle(-90.0, AngleSource::ManualJump);
        assert_eq!(playhead.angle(), 270.0);
        assert_eq!(playhead.last_source(), AngleSource::ManualJump);
        playhead.set_angle(f64::NAN, AngleSource::Direct);
        assert_eq!(playhead.angle(), 270.0);
    }

    #[test]
    fn tiny_negative_angle_wraps_below_360() {
        assert!(normalize_angle(-1e-15) < 360.0);
    }

    #[test]
    fn invalid_rpm_keeps_previous_value() {
        let mut playhead = Playhead::new(60.0);
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY, 500.0] {
            assert!(matches!(
                playhead.set_rpm(bad, 1.0, 240.0),
                Err(PolyError::InvalidRpm { .. })
            ));
        }
        assert_eq!(playhead.rpm(), 60.0);
        playhead.set_rpm(120.0, 1.0, 240.0).unwrap();
        assert_eq!(playhead.seconds_per_revolution(), Some(0.5));
    }
}
