#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{PolyError, PolyResult},
    scale::Pitch,
    synth::config::SynthConfig,
};

pub const MIN_SIDES: usize = 3;
pub const MAX_SIDES: usize = 32;

/// Stable identity of a polygon within a session. Never reused.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolygonId(pub u32);

impl std::fmt::Display for PolygonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A regular polygon on the wheel.
///
/// Vertex `i` sits at `i × 360 / sides` degrees, vertex 0 at angle 0. Each
/// vertex may carry a pitch; `notes.len() == sides` always holds, including
/// for polygons read back from a snapshot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PolygonSnapshot"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    id: PolygonId,
    sides: usize,
    radius: f32,
    notes: Vec<Option<Pitch>>,
    active: bool,
    synth: SynthConfig,
}

/// Serialized form, checked before it becomes a [`Polygon`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct PolygonSnapshot {
    id: PolygonId,
    sides: usize,
    radius: f32,
    notes: Vec<Option<Pitch>>,
    active: bool,
    synth: SynthConfig,
}

#[cfg(feature = "serde")]
impl TryFrom<PolygonSnapshot> for Polygon {
    type Error = PolyError;

    fn try_from(raw: PolygonSnapshot) -> PolyResult<Self> {
        check_sides(raw.sides)?;
        if raw.notes.len() != raw.sides {
            return Err(PolyError::config(
                "notes",
                format!(
                    "polygon {} has {} note slots for {} sides",
                    raw.id,
                    raw.notes.len(),
                    raw.sides
                ),
            ));
        }
        Ok(Self {
            id: raw.id,
            sides: raw.sides,
            radius: raw.radius,
            notes: raw.notes,
            active: raw.active,
            synth: raw.synth.sanitized(),
        })
    }
}

fn check_sides(sides: usize) -> PolyResult<()> {
    if (MIN_SIDES..=MAX_SIDES).contains(&sides) {
        Ok(())
    } else {
        Err(PolyError::InvalidSides {
            sides,
            min: MIN_SIDES,
            max: MAX_SIDES,
        })
    }
}

impl Polygon {
    /// Empty polygon with the default synth settings.
    pub fn new(id: PolygonId, sides: usize, radius: f32) -> PolyResult<Self> {
        check_sides(sides)?;
        Ok(Self {
            id,
            sides,
            radius,
            notes: vec![None; sides],
            active: true,
            synth: SynthConfig::default(),
        })
    }

    pub fn id(&self) -> PolygonId {
        self.id
    }

    pub fn sides(&self) -> usize {
        self.sides
    }

    /// Change the side count. Existing notes keep their index; new slots are
    /// empty, and slots past the new count are dropped.
    pub fn set_sides(&mut self, sides: usize) -> PolyResult<()> {
        check_sides(sides)?;
        self.sides = sides;
        self.notes.resize(sides, None);
        Ok(())
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub(crate) fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub fn notes(&self) -> &[Option<Pitch>] {
        &self.notes
    }

    /// Mutable access to the vertex slots. The slice length is fixed, so the
    /// notes/sides invariant cannot be broken through it.
    pub fn notes_mut(&mut self) -> &mut [Option<Pitch>] {
        &mut self.notes
    }

    pub fn note(&self, vertex: usize) -> Option<Pitch> {
        self.notes.get(vertex).copied().flatten()
    }

    pub fn set_note(&mut self, vertex: usize, pitch: Option<Pitch>) -> PolyResult<()> {
        let sides = self.sides;
        let slot = self
            .notes
            .get_mut(vertex)
            .ok_or(PolyError::InvalidVertex { vertex, sides })?;
        *slot = pitch;
        Ok(())
    }

    pub fn clear_note(&mut self, vertex: usize) -> PolyResult<()> {
        self.set_note(vertex, None)
    }

    /// Angle of `vertex` in degrees, 0 ≤ angle < 360.
    pub fn vertex_angle(&self, vertex: usize) -> f64 {
        (vertex % self.sides) as f64 * 360.0 / self.sides as f64
    }

    /// Vertex nearest to `angle` (degrees, any range).
    pub fn vertex_near(&self, angle: f64) -> usize {
        let step = 360.0 / self.sides as f64;
        let index = (angle.rem_euclid(360.0) / step).round() as usize;
        index % self.sides
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn synth(&self) -> &SynthConfig {
        &self.synth
    }

    /// Replace the synth settings; values are clamped on the way in.
    pub fn set_synth(&mut self, synth: SynthConfig) {
        self.synth = synth.sanitized();
    }

    /// Filled vertices with their indices, in angular order.
    pub fn filled_vertices(&self) -> impl Iterator<Item = (usize, Pitch)> + '_ {
        self.notes
            .iter()
            .enumerate()
            .filter_map(|(i, note)| note.map(|p| (i, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch(name: &str) -> Pitch {
        name.parse().unwrap()
    }

    #[test]
    fn rejects_degenerate_side_counts() {
        assert!(matches!(
            Polygon::new(PolygonId(1), 2, 1.0),
            Err(PolyError::InvalidSides { sides: 2, .. })
        ));
        assert!(Polygon::new(PolygonId(1), MAX_SIDES + 1, 1.0).is_err());
    }

    #[test]
    fn resize_preserves_notes_by_index() {
        let mut poly = Polygon::new(PolygonId(7), 4, 1.0).unwrap();
        poly.set_note(1, Some(pitch("E4"))).unwrap();
        poly.set_note(3, Some(pitch("G4"))).unwrap();

        poly.set_sides(6).unwrap();
        assert_eq!(poly.notes().len(), 6);
        assert_eq!(poly.note(1), Some(pitch("E4")));
        assert_eq!(poly.note(3), Some(pitch("G4")));
        assert_eq!(poly.note(5), None);

        poly.set_sides(3).unwrap();
        assert_eq!(poly.notes().len(), 3);
        assert_eq!(poly.note(1), Some(pitch("E4")));
        assert_eq!(poly.note(3), None);
    }

    #[test]
    fn failed_resize_leaves_polygon_untouched() {
        let mut poly = Polygon::new(PolygonId(1), 5, 1.0).unwrap();
        assert!(poly.set_sides(1).is_err());
        assert_eq!(poly.sides(), 5);
        assert_eq!(poly.notes().len(), 5);
    }

    #[test]
    fn set_note_checks_vertex() {
        let mut poly = Polygon::new(PolygonId(1), 3, 1.0).unwrap();
        let err = poly.set_note(3, Some(pitch("C4"))).unwrap_err();
        assert!(matches!(err, PolyError::InvalidVertex { vertex: 3, sides: 3 }));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_must_match_its_side_count() {
        let mut poly = Polygon::new(PolygonId(4), 3, 1.0).unwrap();
        poly.set_note(0, Some(pitch("C4"))).unwrap();
        let json = serde_json::to_string(&poly).unwrap();
        let back: Polygon = serde_json::from_str(&json).unwrap();
        assert_eq!(back, poly);

        let grown = json.replace("\"sides\":3", "\"sides\":7");
        assert!(serde_json::from_str::<Polygon>(&grown).is_err());

        let degenerate = json.replace("\"sides\":3", "\"sides\":0");
        assert!(serde_json::from_str::<Polygon>(&degenerate).is_err());
    }

    #[test]
    fn vertex_angles_are_evenly_spaced() {
        let poly = Polygon::new(PolygonId(1), 8, 1.0).unwrap();
        assert_eq!(poly.vertex_angle(0), 0.0);
        assert_eq!(poly.vertex_angle(2), 90.0);
        assert_eq!(poly.vertex_near(359.0), 0);
        assert_eq!(poly.vertex_near(100.0), 2);
    }
}
