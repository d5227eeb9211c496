//! Shared state: polygons on the wheel, the playhead, and the session that
//! owns both.

pub mod playhead;
pub mod polygon;
pub mod session;

pub use playhead::{normalize_angle, AngleSource, Playhead};
pub use polygon::{Polygon, PolygonId, MAX_SIDES, MIN_SIDES};
pub use session::Session;
