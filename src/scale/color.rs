#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{degree_of, Pitch, PitchClass, ScaleKind};

/// Plain 8-bit RGB; front ends convert to their own color type.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// One color per scale degree, root first. Warm at the root, cooling towards
/// the leading tone so the tonic always reads as the "hottest" vertex.
pub const DEGREE_RAMP: [Rgb; 7] = [
    Rgb(0xff, 0x4d, 0x4d), // 1
    Rgb(0xff, 0x9f, 0x43), // 2
    Rgb(0xff, 0xe0, 0x66), // 3
    Rgb(0x7b, 0xe0, 0x7b), // 4
    Rgb(0x4d, 0xc9, 0xff), // 5
    Rgb(0x6c, 0x7b, 0xff), // 6
    Rgb(0xc0, 0x7b, 0xff), // 7
];

/// Color for a vertex pitch by its scale degree.
///
/// The degree is the pitch's position in the ordered scale (not its raw pitch
/// class), so the root is always `DEGREE_RAMP[0]` whatever the key. Empty
/// vertices and pitches outside the scale, which can exist for a moment while
/// a scale change is being applied, get `fallback`.
pub fn degree_color(pitch: Option<Pitch>, scale: ScaleKind, root: PitchClass, fallback: Rgb) -> Rgb {
    pitch
        .and_then(|p| degree_of(p.class, scale, root))
        .map(|degree| DEGREE_RAMP[degree % DEGREE_RAMP.len()])
        .unwrap_or(fallback)
}
