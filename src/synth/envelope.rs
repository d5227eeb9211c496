use crate::{
    dsp::envelope::{Breakpoint, GainAutomation},
    error::{PolyError, PolyResult},
    synth::config::EnvelopeSettings,
    MIN_TIME,
};

/*
Envelope Planning
=================

A note's whole amplitude envelope is decided at trigger time, against one
start time T on the audio clock. Nothing is left to a later "note off": the
renderer only interpolates the breakpoints it is given.

Normal case, attack + decay < duration:

  level
  peak ┐    ╱╲
       │   ╱  ╲______________
  sus  │  ╱                  ╲
       │ ╱                    ╲
     0 └╱──────────────────────╲────────── · · · ─┤
        T  attack  decay  hold  release  T+dur   stop_at
           _end    _end         _start

    attack_end    = T + attack
    decay_end     = attack_end + decay
    release_start = max(decay_end, T + duration - release)
    end           = T + duration

The hold may be zero long, and a release longer than what is left of the note
is shortened so the level still reaches zero exactly at T + duration.

Compressed case, attack + decay ≥ duration: there is no room for the shape,
so the level jumps to peak within one sample and fades in a straight line to
zero at T + duration. Every phase mark collapses onto that first sample and
the sustain level is the peak itself.

The oscillator keeps running for a short tail after `end` (`stop_at`), so the
final zero is rendered before the voice is torn down.
*/

/// Breakpoint plan for one note, in seconds on the audio clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSchedule {
    pub start: f64,
    pub attack_end: f64,
    pub decay_end: f64,
    pub release_start: f64,
    pub end: f64,
    pub stop_at: f64,
    pub peak: f32,
    pub sustain_level: f32,
    /// Attack and decay did not fit into the note.
    pub compressed: bool,
}

impl EnvelopeSchedule {
    /// Plan a note of `duration` seconds starting at `start`.
    ///
    /// `settings` are expected to be sanitized already. Fails only for a
    /// duration that is zero, negative or non-finite.
    pub fn plan(
        start: f64,
        duration: f64,
        settings: &EnvelopeSettings,
        peak: f32,
        release_tail: f64,
    ) -> PolyResult<Self> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(PolyError::InvalidDuration(duration));
        }
        let peak = peak.clamp(0.0, 1.0);
        let tail = if release_tail.is_finite() && release_tail > 0.0 {
            release_tail
        } else {
            MIN_TIME as f64
        };
        let end = start + duration;
        let stop_at = end + tail;

        let attack = settings.attack.max(0.0);
        let decay = settings.decay.max(0.0);
        let release = settings.release.max(0.0);

        if attack + decay >= duration {
            let rise = (MIN_TIME as f64).min(duration * 0.5);
            let mark = start + rise;
            return Ok(Self {
                start,
                attack_end: mark,
                decay_end: mark,
                release_start: mark,
                end,
                stop_at,
                peak,
                sustain_level: peak,
                compressed: true,
            });
        }

        let attack_end = (start + attack).min(end);
        let decay_end = (attack_end + decay).min(end);
        let release_start = decay_end.max(end - release);
        Ok(Self {
            start,
            attack_end,
            decay_end,
            release_start,
            end,
            stop_at,
            peak,
            sustain_level: peak * settings.sustain.clamp(0.0, 1.0),
            compressed: false,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Phase marks never go backwards and the voice stops strictly after the
    /// envelope ends.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.attack_end
            && self.attack_end <= self.decay_end
            && self.decay_end <= self.release_start
            && self.release_start <= self.end
            && self.end < self.stop_at
    }

    /// Breakpoints relative to `start`, ready for the renderer.
    pub fn automation(&self) -> GainAutomation {
        let at = |time: f64| time - self.start;
        let points = if self.compressed {
            vec![
                Breakpoint::new(0.0, 0.0),
                Breakpoint::new(at(self.attack_end), self.peak),
                Breakpoint::new(at(self.end), 0.0),
            ]
        } else {
            vec![
                Breakpoint::new(0.0, 0.0),
                Breakpoint::new(at(self.attack_end), self.peak),
                Breakpoint::new(at(self.decay_end), self.sustain_level),
                Breakpoint::new(at(self.release_start), self.sustain_level),
                Breakpoint::new(at(self.end), 0.0),
            ]
        };
        GainAutomation::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(attack: f64, decay: f64, sustain: f32, release: f64) -> EnvelopeSettings {
        EnvelopeSettings {
            attack,
            decay,
            sustain,
            release,
        }
    }

    #[test]
    fn normal_shape_marks() {
        let plan = EnvelopeSchedule::plan(10.0, 1.0, &settings(0.1, 0.2, 0.5, 0.3), 0.8, 0.05).unwrap();
        assert!(!plan.compressed);
        assert!((plan.attack_end - 10.1).abs() < 1e-12);
        assert!((plan.decay_end - 10.3).abs() < 1e-12);
        assert!((plan.release_start - 10.7).abs() < 1e-12);
        assert_eq!(plan.end, 11.0);
        assert!((plan.stop_at - 11.05).abs() < 1e-12);
        assert!((plan.sustain_level - 0.4).abs() < 1e-6);
        assert!(plan.is_ordered());
    }

    #[test]
    fn long_release_is_shortened_to_fit() {
        let plan = EnvelopeSchedule::plan(0.0, 0.5, &settings(0.1, 0.1, 0.7, 2.0), 1.0, 0.05).unwrap();
        assert_eq!(plan.release_start, plan.decay_end);
        assert!(plan.is_ordered());
        assert_eq!(plan.automation().level_at(0.5), 0.0);
    }

    #[test]
    fn compressed_note_is_a_straight_fade() {
        let plan = EnvelopeSchedule::plan(0.0, 0.2, &settings(0.15, 0.1, 0.3, 0.1), 1.0, 0.05).unwrap();
        assert!(plan.compressed);
        assert_eq!(plan.sustain_level, plan.peak);
        assert!(plan.is_ordered());

        let automation = plan.automation();
        let mid = automation.level_at(0.1);
        assert!((mid - 0.5).abs() < 0.01, "halfway through the fade, got {mid}");
        assert_eq!(automation.level_at(0.2), 0.0);
    }

    #[test]
    fn zero_attack_still_ordered() {
        let plan = EnvelopeSchedule::plan(0.0, 1.0, &settings(0.0, 0.0, 1.0, 0.0), 0.5, 0.05).unwrap();
        assert!(plan.is_ordered());
        assert_eq!(plan.automation().level_at(0.5), 0.5);
    }

    #[test]
    fn rejects_unusable_durations() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                EnvelopeSchedule::plan(0.0, bad, &EnvelopeSettings::default(), 1.0, 0.05),
                Err(PolyError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn missing_tail_still_stops_after_end() {
        let plan = EnvelopeSchedule::plan(0.0, 1.0, &EnvelopeSettings::default(), 1.0, 0.0).unwrap();
        assert!(plan.stop_at > plan.end);
    }
}
