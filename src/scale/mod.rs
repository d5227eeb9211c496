//! Scale model: valid pitch sets and keeping stored notes inside them.
//!
//! A scale is an interval pattern laid on a root. Changing the scale or the
//! root never deletes a note; every stored pitch is pulled onto the nearest
//! member of the new pitch set instead, and pitches that already fit are left
//! alone so a composition does not reshuffle when nothing forced it to.

/// Degree-indexed color ramp for vertex coloring.
pub mod color;
/// Pitch classes, pitches and equal-tempered frequencies.
pub mod pitch;

pub use color::{degree_color, Rgb, DEGREE_RAMP};
pub use pitch::{midi_note_to_freq, Pitch, PitchClass};

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::polygon::Polygon;

/*
Scales as Interval Patterns
===========================

Each scale is a list of semitone offsets from the root. The notes of a scale
are the root's chromatic index plus each offset, modulo 12, kept in pattern
order so position 0 is always the root:

    Major:           0  2  4  5  7  9  11
    C Major:         C  D  E  F  G  A  B
    D Major:         D  E  F# G  A  B  C#     (every note two steps up)

The sixth degree of D major is 9 + 2 = 11 (B) and the seventh is
11 + 2 = 13 ≡ 1 (C#): the pattern wraps past B back to the bottom of the
octave, which is why the ordered scale is not sorted by chromatic index for
most roots.

Name lookup is forgiving: case, spaces, dashes and underscores are ignored,
and modal aliases (ionian, aeolian) resolve to their common names. A name we
do not know resolves to Major. That fallback is deliberate: a stale or
misspelled scale name in a saved session still gives a playable instrument.
*/

const MAJOR: &[i32] = &[0, 2, 4, 5, 7, 9, 11];
const NATURAL_MINOR: &[i32] = &[0, 2, 3, 5, 7, 8, 10];
const HARMONIC_MINOR: &[i32] = &[0, 2, 3, 5, 7, 8, 11];
const MELODIC_MINOR: &[i32] = &[0, 2, 3, 5, 7, 9, 11];
const DORIAN: &[i32] = &[0, 2, 3, 5, 7, 9, 10];
const PHRYGIAN: &[i32] = &[0, 1, 3, 5, 7, 8, 10];
const LYDIAN: &[i32] = &[0, 2, 4, 6, 7, 9, 11];
const MIXOLYDIAN: &[i32] = &[0, 2, 4, 5, 7, 9, 10];
const LOCRIAN: &[i32] = &[0, 1, 3, 5, 6, 8, 10];
const MAJOR_PENTATONIC: &[i32] = &[0, 2, 4, 7, 9];
const MINOR_PENTATONIC: &[i32] = &[0, 3, 5, 7, 10];

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScaleKind {
    #[default]
    Major,
    NaturalMinor,
    HarmonicMinor,
    MelodicMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    MajorPentatonic,
    MinorPentatonic,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 11] = [
        ScaleKind::Major,
        ScaleKind::NaturalMinor,
        ScaleKind::HarmonicMinor,
        ScaleKind::MelodicMinor,
        ScaleKind::Dorian,
        ScaleKind::Phrygian,
        ScaleKind::Lydian,
        ScaleKind::Mixolydian,
        ScaleKind::Locrian,
        ScaleKind::MajorPentatonic,
        ScaleKind::MinorPentatonic,
    ];

    /// Semitone offsets from the root, in degree order.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ScaleKind::Major => MAJOR,
            ScaleKind::NaturalMinor => NATURAL_MINOR,
            ScaleKind::HarmonicMinor => HARMONIC_MINOR,
            ScaleKind::MelodicMinor => MELODIC_MINOR,
            ScaleKind::Dorian => DORIAN,
            ScaleKind::Phrygian => PHRYGIAN,
            ScaleKind::Lydian => LYDIAN,
            ScaleKind::Mixolydian => MIXOLYDIAN,
            ScaleKind::Locrian => LOCRIAN,
            ScaleKind::MajorPentatonic => MAJOR_PENTATONIC,
            ScaleKind::MinorPentatonic => MINOR_PENTATONIC,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleKind::Major => "Major",
            ScaleKind::NaturalMinor => "Natural Minor",
            ScaleKind::HarmonicMinor => "Harmonic Minor",
            ScaleKind::MelodicMinor => "Melodic Minor",
            ScaleKind::Dorian => "Dorian",
            ScaleKind::Phrygian => "Phrygian",
            ScaleKind::Lydian => "Lydian",
            ScaleKind::Mixolydian => "Mixolydian",
            ScaleKind::Locrian => "Locrian",
            ScaleKind::MajorPentatonic => "Major Pentatonic",
            ScaleKind::MinorPentatonic => "Minor Pentatonic",
        }
    }

    /// Strict lookup; `None` for names we do not know.
    pub fn lookup(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        let kind = match key.as_str() {
            "major" | "ionian" => ScaleKind::Major,
            "minor" | "naturalminor" | "aeolian" => ScaleKind::NaturalMinor,
            "harmonicminor" => ScaleKind::HarmonicMinor,
            "melodicminor" => ScaleKind::MelodicMinor,
            "dorian" => ScaleKind::Dorian,
            "phrygian" => ScaleKind::Phrygian,
            "lydian" => ScaleKind::Lydian,
            "mixolydian" => ScaleKind::Mixolydian,
            "locrian" => ScaleKind::Locrian,
            "pentatonic" | "majorpentatonic" => ScaleKind::MajorPentatonic,
            "minorpentatonic" => ScaleKind::MinorPentatonic,
            _ => return None,
        };
        Some(kind)
    }

    /// Lookup that falls back to Major for unknown names.
    pub fn from_name(name: &str) -> Self {
        Self::lookup(name).unwrap_or_else(|| {
            debug!(scale = name, "unknown scale name, using Major intervals");
            ScaleKind::default()
        })
    }

    /// The next scale in `ALL`, wrapping (used by the UI to cycle).
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Ordered pitch classes of this scale on `root`.
    pub fn notes(self, root: PitchClass) -> Vec<PitchClass> {
        self.intervals()
            .iter()
            .map(|&offset| root.transpose(offset))
            .collect()
    }
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered pitch classes for a scale name and root.
///
/// Unknown names use the Major pattern (see [`ScaleKind::from_name`]).
pub fn scale_notes(scale_name: &str, root: PitchClass) -> Vec<PitchClass> {
    ScaleKind::from_name(scale_name).notes(root)
}

/// Pull a pitch onto the nearest member of `pitch_set`.
///
/// Members come back unchanged. Otherwise the winner minimises the absolute
/// difference of chromatic indices (0..=11, not wrapped around the octave);
/// on a tie the member that appears first in `pitch_set` wins. The octave is
/// kept unless that would pass G9, in which case the note drops one octave.
/// Empty pitches and empty sets are returned untouched.
pub fn remap_pitch(pitch: Option<Pitch>, pitch_set: &[PitchClass]) -> Option<Pitch> {
    let pitch = pitch?;
    if pitch_set.is_empty() || pitch_set.contains(&pitch.class) {
        return Some(pitch);
    }

    let from = pitch.class.index() as i32;
    let mut best = pitch_set[0];
    let mut best_distance = (best.index() as i32 - from).abs();
    for &candidate in &pitch_set[1..] {
        let distance = (candidate.index() as i32 - from).abs();
        // strict: earlier candidates keep ties
        if distance < best_distance {
            best = candidate;
            best_distance = distance;
        }
    }

    let moved = pitch
        .with_class(best)
        .or_else(|_| Pitch::new(best, pitch.octave - 1))
        .unwrap_or(pitch);
    Some(moved)
}

/// Remap every vertex of every polygon onto `scale`/`root`.
///
/// Returns a new collection; the input is untouched. Running it twice with
/// the same target is the same as running it once, because the first pass
/// leaves only members and members are stable.
pub fn remap_all_polygons(polygons: &[Polygon], scale: ScaleKind, root: PitchClass) -> Vec<Polygon> {
    let pitch_set = scale.notes(root);
    polygons
        .iter()
        .map(|polygon| {
            let mut remapped = polygon.clone();
            for note in remapped.notes_mut() {
                *note = remap_pitch(*note, &pitch_set);
            }
            remapped
        })
        .collect()
}

/// Position of `class` within the ordered scale, if it belongs to it.
pub fn degree_of(class: PitchClass, scale: ScaleKind, root: PitchClass) -> Option<usize> {
    scale.notes(root).iter().position(|&c| c == class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use PitchClass::*;

    fn pitch(name: &str) -> Option<Pitch> {
        Some(name.parse().unwrap())
    }

    #[test]
    fn c_major_is_the_naturals() {
        assert_eq!(scale_notes("Major", C), vec![C, D, E, F, G, A, B]);
    }

    #[test]
    fn d_major_shifts_every_degree_by_two() {
        let c_major = scale_notes("Major", C);
        let d_major = scale_notes("Major", D);
        assert_eq!(d_major, vec![D, E, Fs, G, A, B, Cs]);
        for (c, d) in c_major.iter().zip(&d_major) {
            assert_eq!(c.transpose(2), *d);
        }
    }

    #[test]
    fn pentatonic_has_five_notes() {
        assert_eq!(scale_notes("pentatonic", A), vec![A, B, Cs, E, Fs]);
        assert_eq!(scale_notes("minor-pentatonic", A), vec![A, C, D, E, G]);
    }

    #[test]
    fn unknown_scale_falls_back_to_major() {
        assert_eq!(scale_notes("Hungarian Gypsy", G), scale_notes("Major", G));
        assert_eq!(ScaleKind::lookup("Hungarian Gypsy"), None);
    }

    #[test]
    fn lookup_ignores_case_and_separators() {
        assert_eq!(ScaleKind::lookup("harmonic_minor"), Some(ScaleKind::HarmonicMinor));
        assert_eq!(ScaleKind::lookup("AEOLIAN"), Some(ScaleKind::NaturalMinor));
    }

    #[test]
    fn member_pitch_is_stable() {
        let set = scale_notes("Major", C);
        assert_eq!(remap_pitch(pitch("E3"), &set), pitch("E3"));
    }

    #[test]
    fn tie_goes_to_first_member_in_set_order() {
        // C# sits between C and D; C comes first in [C, D]
        assert_eq!(remap_pitch(pitch("C#4"), &[C, D]), pitch("C4"));
        // with the set enumerated the other way round, D wins the tie
        assert_eq!(remap_pitch(pitch("C#4"), &[D, C]), pitch("D4"));
    }

    #[test]
    fn nearest_is_linear_not_circular() {
        // B (11) is 1 step from C across the octave boundary, but the distance
        // is measured on 0..=11, so A# (10) -> A (9) wins over C (0).
        assert_eq!(remap_pitch(pitch("A#2"), &[C, A]), pitch("A2"));
        assert_eq!(remap_pitch(pitch("B2"), &[C, A]), pitch("A2"));
    }

    #[test]
    fn remap_never_passes_g9() {
        // G9 pulls up to G#, which has no MIDI number in octave 9
        let set = scale_notes("Minor Pentatonic", F);
        let remapped = remap_pitch(pitch("G9"), &set).unwrap();
        assert_eq!(remapped, "G#8".parse().unwrap());
        assert_eq!(remapped.midi(), 116);

        // members that still fit keep octave 9
        assert_eq!(remap_pitch(pitch("E9"), &set), pitch("F9"));
    }

    #[test]
    fn empty_pitch_maps_to_itself() {
        assert_eq!(remap_pitch(None, &[C, D]), None);
    }

    #[test]
    fn degree_uses_scale_order() {
        assert_eq!(degree_of(Cs, ScaleKind::Major, D), Some(6));
        assert_eq!(degree_of(C, ScaleKind::Major, D), None);
    }

    #[test]
    fn next_cycles_through_all() {
        let mut kind = ScaleKind::Major;
        for _ in 0..ScaleKind::ALL.len() {
            kind = kind.next();
        }
        assert_eq!(kind, ScaleKind::Major);
    }
}
