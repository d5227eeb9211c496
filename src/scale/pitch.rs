use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PolyError, PolyResult};

/*
Pitch Classes and Pitches
=========================

A pitch class is one of the twelve chromatic note names, independent of
octave. Their order is fixed and everything in the scale model indexes into
it:

    index:  0   1   2   3   4   5   6   7   8   9   10  11
    class:  C   C#  D   D#  E   F   F#  G   G#  A   A#  B

Flats are parsed as the sharp of the note below (Db = C#, Bb = A#) and always
displayed as sharps. E#, B#, Cb and Fb are accepted and wrap into the
neighbouring natural (Cb4 is B3, B#3 is C4).

A pitch adds an octave in scientific pitch notation. The MIDI number is

    note_number = 12 * (octave + 1) + class_index

so C4 = 60 and A4 = 69. Frequencies use twelve-tone equal temperament around
A4 = 440 Hz:

    frequency = 440 * 2^((note_number - 69) / 12)

Octaves -1 through 9 are playable; anything outside that range is rejected
rather than silently clamped so a wrong pitch never sounds.
*/

/// Reference pitch for equal temperament.
pub const A4_FREQUENCY: f32 = 440.0;
/// MIDI note number of the reference pitch.
pub const A4_MIDI: u8 = 69;

pub const MIN_OCTAVE: i8 = -1;
pub const MAX_OCTAVE: i8 = 9;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Position in the chromatic order (C = 0 .. B = 11).
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Class at `index` modulo 12.
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(12) as usize]
    }

    /// Move by `semitones`, wrapping within the octave.
    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_index(self.index() as i32 + semitones)
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// Parse a letter plus accidentals; returns the class and the octave
    /// carry produced by spellings such as `B#` or `Cb`.
    fn parse_spelling(spelling: &str) -> Option<(Self, i32)> {
        let mut chars = spelling.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let natural: i32 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let mut offset = 0;
        for accidental in chars {
            match accidental {
                '#' | 's' | '♯' => offset += 1,
                'b' | '♭' => offset -= 1,
                _ => return None,
            }
        }

        let raw = natural + offset;
        Some((Self::from_index(raw), raw.div_euclid(12)))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = PolyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_spelling(s.trim())
            .map(|(class, _)| class)
            .ok_or_else(|| PolyError::UnknownPitch(s.to_string()))
    }
}

impl TryFrom<String> for PitchClass {
    type Error = PolyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchClass> for String {
    fn from(class: PitchClass) -> Self {
        class.name().to_string()
    }
}

/// A pitch class placed in a specific octave.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub class: PitchClass,
    pub octave: i8,
}

impl Pitch {
    /// Build a pitch, rejecting octaves outside the playable range.
    pub fn new(class: PitchClass, octave: i8) -> PolyResult<Self> {
        check_range(class, octave as i32)?;
        Ok(Self { class, octave })
    }

    /// Pitch for a MIDI note number (0..=127).
    pub fn from_midi(note: u8) -> Self {
        let note = note.min(127) as i32;
        Self {
            class: PitchClass::from_index(note),
            octave: (note / 12 - 1) as i8,
        }
    }

    pub fn midi(self) -> u8 {
        (12 * (self.octave as i32 + 1) + self.class.index() as i32).clamp(0, 127) as u8
    }

    /// Equal-tempered frequency in Hz.
    pub fn frequency(self) -> f32 {
        midi_note_to_freq(self.midi())
    }

    /// Same octave, different class. Fails when the result would pass G9.
    pub fn with_class(self, class: PitchClass) -> PolyResult<Self> {
        Self::new(class, self.octave)
    }
}

/// Octave must be -1..=9 and the note must land on a MIDI number (G9 is the top).
fn check_range(class: PitchClass, octave: i32) -> PolyResult<()> {
    let in_octaves = (MIN_OCTAVE as i32..=MAX_OCTAVE as i32).contains(&octave);
    if !in_octaves || 12 * (octave + 1) + class.index() as i32 > 127 {
        return Err(PolyError::PitchOutOfRange {
            pitch: format!("{class}{octave}"),
        });
    }
    Ok(())
}

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((note as f32 - A4_MIDI as f32) / 12.0)
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = PolyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(|| PolyError::UnknownPitch(s.to_string()))?;
        let (spelling, octave) = trimmed.split_at(split);

        let (class, carry) = PitchClass::parse_spelling(spelling)
            .ok_or_else(|| PolyError::UnknownPitch(s.to_string()))?;
        let octave: i32 = octave
            .parse()
            .map_err(|_| PolyError::UnknownPitch(s.to_string()))?;

        let octave = octave + carry;
        check_range(class, octave)?;

        Ok(Self {
            class,
            octave: octave as i8,
        })
    }
}

impl TryFrom<String> for Pitch {
    type Error = PolyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pitch> for String {
    fn from(pitch: Pitch) -> Self {
        pitch.to_string()
    }
}
