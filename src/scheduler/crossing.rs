/*
Vertex Crossing Detection
=========================

The playhead position is kept as an unwrapped "travel" in degrees: it only
grows while playing and is never folded back into [0, 360). Each frame the
scheduler sweeps from the previous travel to the new one and asks, per
vertex, whether some copy of the vertex angle lies inside the sweep:

    crossed  ⇔  ∃ k ∈ ℤ :  prev < v + 360·k ≤ next

Consecutive sweeps share their boundary (this frame's `next` is the next
frame's `prev`) and the interval is open on the left, so every point of the
travel belongs to exactly one sweep and a vertex sitting exactly on a frame
boundary fires once. Wraparound needs no special case because travel never
wraps.

A sweep that starts from a fresh position (first play, reset, manual jump)
closes the left end too, so the vertex the playhead is resting on sounds
immediately.

A sweep longer than a revolution (the frame loop stalled) still reports each
vertex at most once.
*/

/// Whether a vertex at `vertex_angle` degrees lies in the sweep from `prev` to
/// `next` (unwrapped degrees). `include_start` closes the left end.
#[inline]
pub fn crosses(vertex_angle: f64, prev: f64, next: f64, include_start: bool) -> bool {
    if !(next >= prev) {
        return false;
    }
    let mut k = ((prev - vertex_angle) / 360.0).ceil();
    let mut candidate = vertex_angle + 360.0 * k;
    // ceil can land one copy short or exactly on the open boundary
    while candidate < prev || (!include_start && candidate <= prev) {
        k += 1.0;
        candidate = vertex_angle + 360.0 * k;
    }
    candidate <= next
}

/// Indices of the vertices of an `sides`-gon crossed by the sweep, in index
/// order.
pub fn crossed_vertices(
    sides: usize,
    prev: f64,
    next: f64,
    include_start: bool,
) -> impl Iterator<Item = usize> {
    let step = 360.0 / sides.max(1) as f64;
    (0..sides).filter(move |&i| crosses(i as f64 * step, prev, next, include_start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_vertex_inside_sweep() {
        assert!(crosses(90.0, 80.0, 100.0, false));
        assert!(!crosses(90.0, 95.0, 100.0, false));
    }

    #[test]
    fn wraps_past_360() {
        // sweep 350 -> 370 contains the vertex at 0 (as 360)
        assert!(crosses(0.0, 350.0, 370.0, false));
        assert!(crosses(10.0, 710.0, 725.0, false));
        assert!(!crosses(20.0, 710.0, 725.0, false));
    }

    #[test]
    fn boundary_belongs_to_exactly_one_sweep() {
        // vertex exactly at a frame boundary
        let first = crosses(120.0, 100.0, 120.0, false);
        let second = crosses(120.0, 120.0, 140.0, false);
        assert!(first && !second);
    }

    #[test]
    fn fresh_start_includes_resting_vertex() {
        assert!(crosses(0.0, 0.0, 3.0, true));
        assert!(!crosses(0.0, 0.0, 3.0, false));
    }

    #[test]
    fn long_sweep_reports_each_vertex_once() {
        let hits: Vec<_> = crossed_vertices(4, 10.0, 1_000.0, false).collect();
        assert_eq!(hits, vec![0, 1, 2, 3]);
    }

    #[test]
    fn backwards_or_empty_sweep_hits_nothing() {
        assert_eq!(crossed_vertices(6, 50.0, 40.0, true).count(), 0);
        assert_eq!(crossed_vertices(6, 50.0, f64::NAN, true).count(), 0);
        assert_eq!(crossed_vertices(6, 50.0, 50.0, false).count(), 0);
    }
}
