#[cfg(feature = "serde")]
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::SessionDefaults,
    error::{PolyError, PolyResult},
    model::{
        playhead::Playhead,
        polygon::{Polygon, PolygonId},
    },
    scale::{remap_all_polygons, Pitch, PitchClass, ScaleKind},
    synth::config::SynthConfig,
};

/// All state the scheduler, the engine and the front end share.
///
/// There is exactly one writer: every edit goes through a method here, so
/// invariants (notes follow the scale, radii follow the spacing, ids are
/// never reused) are restored in one place. Polygon list order is the order
/// triggers fire in within a frame.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SessionSnapshot"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    polygons: Vec<Polygon>,
    playhead: Playhead,
    scale: ScaleKind,
    root: PitchClass,
    base_radius: f32,
    spacing: f32,
    next_id: u32,
}

/// Serialized form. Polygons check themselves; the session checks that ids
/// are unique and that `next_id` is past every id in use.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct SessionSnapshot {
    polygons: Vec<Polygon>,
    playhead: Playhead,
    scale: ScaleKind,
    root: PitchClass,
    base_radius: f32,
    spacing: f32,
    next_id: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<SessionSnapshot> for Session {
    type Error = PolyError;

    fn try_from(raw: SessionSnapshot) -> PolyResult<Self> {
        let mut seen = HashSet::new();
        for polygon in &raw.polygons {
            if !seen.insert(polygon.id()) {
                return Err(PolyError::config("polygons", format!("duplicate polygon id {}", polygon.id())));
            }
        }
        let past_used = raw.polygons.iter().map(|p| p.id().0 + 1).max().unwrap_or(1);
        let next_id = raw.next_id.max(past_used);
        if next_id != raw.next_id {
            debug!(stored = raw.next_id, next_id, "snapshot id counter moved past ids in use");
        }

        let mut session = Self {
            polygons: raw.polygons,
            playhead: raw.playhead,
            scale: raw.scale,
            root: raw.root,
            base_radius: raw.base_radius,
            spacing: raw.spacing,
            next_id,
        };
        session.relayout();
        Ok(session)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::empty(ScaleKind::Major, PitchClass::C, 1.0, 0.6)
    }
}

impl Session {
    fn empty(scale: ScaleKind, root: PitchClass, base_radius: f32, spacing: f32) -> Self {
        Self {
            polygons: Vec::new(),
            playhead: Playhead::default(),
            scale,
            root,
            base_radius,
            spacing,
            next_id: 1,
        }
    }

    /// Session with the configured scale and starting polygons.
    pub fn from_defaults(defaults: &SessionDefaults, rpm: f64) -> PolyResult<Self> {
        let scale = ScaleKind::from_name(&defaults.scale);
        let mut session = Self::empty(scale, defaults.root, defaults.base_radius, defaults.spacing);
        session.playhead = Playhead::new(rpm);
        for &sides in &defaults.polygons {
            session.add_polygon(sides)?;
        }
        Ok(session)
    }

    // -- polygons -----------------------------------------------------------

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn polygon(&self, id: PolygonId) -> Option<&Polygon> {
        self.polygons.iter().find(|p| p.id() == id)
    }

    fn polygon_mut(&mut self, id: PolygonId) -> PolyResult<&mut Polygon> {
        self.polygons
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(PolyError::UnknownPolygon(id.0))
    }

    pub fn active_polygon_count(&self) -> usize {
        self.polygons.iter().filter(|p| p.is_active()).count()
    }

    /// Append an empty polygon on the next ring out.
    pub fn add_polygon(&mut self, sides: usize) -> PolyResult<PolygonId> {
        let id = PolygonId(self.next_id);
        let radius = self.radius_for(self.polygons.len());
        let polygon = Polygon::new(id, sides, radius)?;
        self.next_id += 1;
        self.polygons.push(polygon);
        debug!(%id, sides, "polygon added");
        Ok(id)
    }

    pub fn remove_polygon(&mut self, id: PolygonId) -> PolyResult<Polygon> {
        let index = self
            .polygons
            .iter()
            .position(|p| p.id() == id)
            .ok_or(PolyError::UnknownPolygon(id.0))?;
        let removed = self.polygons.remove(index);
        self.relayout();
        debug!(%id, "polygon removed");
        Ok(removed)
    }

    pub fn remove_last_polygon(&mut self) -> Option<Polygon> {
        let id = self.polygons.last()?.id();
        self.remove_polygon(id).ok()
    }

    pub fn set_sides(&mut self, id: PolygonId, sides: usize) -> PolyResult<()> {
        self.polygon_mut(id)?.set_sides(sides)
    }

    pub fn set_note(&mut self, id: PolygonId, vertex: usize, pitch: Option<Pitch>) -> PolyResult<()> {
        self.polygon_mut(id)?.set_note(vertex, pitch)
    }

    /// Parse `name` ("C4", "F#3", "Bb2") and store it on the vertex.
    pub fn set_note_named(&mut self, id: PolygonId, vertex: usize, name: &str) -> PolyResult<()> {
        let pitch: Pitch = name.parse()?;
        self.set_note(id, vertex, Some(pitch))
    }

    pub fn clear_note(&mut self, id: PolygonId, vertex: usize) -> PolyResult<()> {
        self.polygon_mut(id)?.clear_note(vertex)
    }

    pub fn set_active(&mut self, id: PolygonId, active: bool) -> PolyResult<()> {
        self.polygon_mut(id)?.set_active(active);
        Ok(())
    }

    pub fn set_synth(&mut self, id: PolygonId, synth: SynthConfig) -> PolyResult<()> {
        self.polygon_mut(id)?.set_synth(synth);
        Ok(())
    }

    // -- layout -------------------------------------------------------------

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn base_radius(&self) -> f32 {
        self.base_radius
    }

    pub fn set_spacing(&mut self, spacing: f32) -> PolyResult<()> {
        if !(spacing.is_finite() && spacing >= 0.0) {
            return Err(PolyError::config("spacing", format!("{spacing} is not a usable ring spacing")));
        }
        self.spacing = spacing;
        self.relayout();
        Ok(())
    }

    fn radius_for(&self, index: usize) -> f32 {
        self.base_radius + index as f32 * self.spacing
    }

    fn relayout(&mut self) {
        let (base, spacing) = (self.base_radius, self.spacing);
        for (index, polygon) in self.polygons.iter_mut().enumerate() {
            polygon.set_radius(base + index as f32 * spacing);
        }
    }

    // -- scale --------------------------------------------------------------

    pub fn scale(&self) -> ScaleKind {
        self.scale
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    /// Ordered pitch classes of the current scale.
    pub fn scale_notes(&self) -> Vec<PitchClass> {
        self.scale.notes(self.root)
    }

    /// Switch scale and root, pulling every stored note onto the new scale.
    pub fn set_scale(&mut self, scale: ScaleKind, root: PitchClass) {
        self.polygons = remap_all_polygons(&self.polygons, scale, root);
        self.scale = scale;
        self.root = root;
        info!(scale = %scale, root = %root, "scale changed");
    }

    /// Name-based form; unknown names fall back to Major.
    pub fn set_scale_named(&mut self, name: &str, root: PitchClass) {
        self.set_scale(ScaleKind::from_name(name), root);
    }

    // -- playhead -----------------------------------------------------------

    pub fn playhead(&self) -> &Playhead {
        &self.playhead
    }

    pub(crate) fn playhead_mut(&mut self) -> &mut Playhead {
        &mut self.playhead
    }

    // -- exchange -----------------------------------------------------------

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> PolyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(source: &str) -> PolyResult<Self> {
        Ok(serde_json::from_str(source)?)
    }
}
