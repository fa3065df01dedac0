use smallvec::SmallVec;

use crate::{camera::CameraPoint, foundation::math::lerp};

/// One polygon edge surviving near-plane clipping. Both endpoints are
/// guaranteed to have `local_x >= near_epsilon`.
#[derive(Clone, Copy, Debug)]
pub struct VisibleEdge {
    pub a: CameraPoint,
    pub b: CameraPoint,
}

/// Edge sets are small (one per polygon side), so keep them inline.
pub type EdgeList = SmallVec<[VisibleEdge; 8]>;

fn clip_toward(near: CameraPoint, far: CameraPoint, eps: f64) -> CameraPoint {
    let t = (eps - near.local_x) / (far.local_x - near.local_x);
    CameraPoint {
        local_x: eps,
        local_y: lerp(near.local_y, far.local_y, t),
        distance: lerp(near.distance, far.distance, t),
    }
}

/// Near-plane clip the edges of a camera-space polygon ring.
///
/// Edge i runs from vertex i to vertex (i+1) mod n. Edges fully behind the
/// near plane are dropped; edges crossing it get the behind endpoint replaced
/// by the linear interpolation at `local_x = eps` (with `local_y` and
/// `distance` interpolated by the same parameter). An empty result means the
/// polygon is entirely invisible this frame and must not be drawn at all.
pub fn clip_polygon_edges(ring: &[CameraPoint], eps: f64) -> EdgeList {
    let mut edges = EdgeList::new();
    let n = ring.len();
    if n < 3 {
        return edges;
    }

    for i in 0..n {
        let v1 = ring[i];
        let v2 = ring[(i + 1) % n];

        let a_front = v1.local_x > eps;
        let b_front = v2.local_x > eps;

        match (a_front, b_front) {
            (true, true) => edges.push(VisibleEdge { a: v1, b: v2 }),
            (false, true) => edges.push(VisibleEdge {
                a: clip_toward(v1, v2, eps),
                b: v2,
            }),
            (true, false) => edges.push(VisibleEdge {
                a: v1,
                b: clip_toward(v2, v1, eps),
            }),
            (false, false) => {}
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(local_x: f64, local_y: f64, distance: f64) -> CameraPoint {
        CameraPoint {
            local_x,
            local_y,
            distance,
        }
    }

    #[test]
    fn polygon_fully_behind_yields_no_edges() {
        let ring = [pt(-2.0, -1.0, 2.2), pt(-3.0, 0.0, 3.0), pt(-2.0, 1.0, 2.2)];
        assert!(clip_polygon_edges(&ring, 0.1).is_empty());
    }

    #[test]
    fn polygon_fully_ahead_keeps_all_edges_verbatim() {
        let ring = [pt(2.0, -1.0, 2.2), pt(3.0, 0.0, 3.0), pt(2.0, 1.0, 2.2)];
        let edges = clip_polygon_edges(&ring, 0.1);
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].a.local_x, 2.0);
        assert_eq!(edges[0].b.local_x, 3.0);
    }

    #[test]
    fn crossing_edge_is_interpolated_at_the_near_plane() {
        // v1 behind at -1, v2 ahead at 3, eps 0.1:
        // t = (0.1 - (-1)) / (3 - (-1)) = 0.275.
        let ring = [
            pt(-1.0, 0.0, 1.0),
            pt(3.0, 4.0, 5.0),
            pt(3.0, -4.0, 5.0),
        ];
        let edges = clip_polygon_edges(&ring, 0.1);

        let clipped = edges
            .iter()
            .find(|e| e.a.local_x == 0.1)
            .expect("crossing edge present");
        assert!((clipped.a.local_y - 0.275 * 4.0).abs() < 1e-12);
        assert!((clipped.a.distance - (1.0 + 0.275 * 4.0)).abs() < 1e-12);
        assert_eq!(clipped.b.local_x, 3.0);
    }

    #[test]
    fn both_crossing_directions_clip_to_eps() {
        let ring = [pt(3.0, 1.0, 3.2), pt(-1.0, 0.0, 1.0), pt(3.0, -1.0, 3.2)];
        let edges = clip_polygon_edges(&ring, 0.1);
        // Two crossing edges plus the fully-front edge between the two front vertices.
        assert_eq!(edges.len(), 3);
        for e in &edges {
            assert!(e.a.local_x >= 0.1);
            assert!(e.b.local_x >= 0.1);
        }
    }

    #[test]
    fn degenerate_ring_is_rejected() {
        let ring = [pt(1.0, 0.0, 1.0), pt(2.0, 0.0, 2.0)];
        assert!(clip_polygon_edges(&ring, 0.1).is_empty());
    }
}
