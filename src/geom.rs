//! Floating-point geometry predicates.
//!
//! Everything here follows the reference earcut comparisons exactly,
//! including which side of a tie each `>=`/`>` lands on; the repair passes
//! are sensitive to boundary-touching points.

use num_traits::float::Float;

use crate::ring::{Node, NodeId, RingStore};

/// Doubled signed area of the triangle `p q r`. Negative for the winding
/// the clipper treats as convex.
pub(crate) fn tri_area<T: Float>(p: &Node<T>, q: &Node<T>, r: &Node<T>) -> T {
    (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y)
}

pub(crate) fn same_pos<T: Float>(p: &Node<T>, q: &Node<T>) -> bool {
    p.x == q.x && p.y == q.y
}

/// Half-plane test against all three edges; boundary counts as inside.
#[allow(clippy::too_many_arguments)]
pub(crate) fn point_in_triangle<T: Float>(
    ax: T,
    ay: T,
    bx: T,
    by: T,
    cx: T,
    cy: T,
    px: T,
    py: T,
) -> bool {
    (cx - px) * (ay - py) >= (ax - px) * (cy - py)
        && (ax - px) * (by - py) >= (bx - px) * (ay - py)
        && (bx - px) * (cy - py) >= (cx - px) * (by - py)
}

fn orient_sign<T: Float>(v: T) -> i32 {
    (v > T::zero()) as i32 - (v < T::zero()) as i32
}

/// For collinear p, q, r: does q lie on the segment pr?
fn on_segment<T: Float>(p: &Node<T>, q: &Node<T>, r: &Node<T>) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Segment intersection by orientation signs, with the collinear-overlap
/// cases handled explicitly. Touching endpoints count as intersecting.
pub(crate) fn segments_intersect<T: Float>(
    p1: &Node<T>,
    q1: &Node<T>,
    p2: &Node<T>,
    q2: &Node<T>,
) -> bool {
    let o1 = orient_sign(tri_area(p1, q1, p2));
    let o2 = orient_sign(tri_area(p1, q1, q2));
    let o3 = orient_sign(tri_area(p2, q2, p1));
    let o4 = orient_sign(tri_area(p2, q2, q1));

    (o1 != o2 && o3 != o4)
        || (o3 == 0 && on_segment(p2, p1, q2))
        || (o4 == 0 && on_segment(p2, q1, q2))
        || (o2 == 0 && on_segment(p1, q2, q1))
        || (o1 == 0 && on_segment(p1, p2, q1))
}

/// Shoelace sum over the vertex range `start..end` of a flat coordinate
/// buffer. Sign convention matches `tri_area`.
pub(crate) fn ring_area<T: Float>(coords: &[T], start: usize, end: usize) -> T {
    if start >= end {
        return T::zero();
    }
    let (mut bx, mut by) = (coords[2 * (end - 1)], coords[2 * (end - 1) + 1]);
    let mut sum = T::zero();
    for v in start..end {
        let (ax, ay) = (coords[2 * v], coords[2 * v + 1]);
        sum = sum + (bx - ax) * (ay + by);
        (bx, by) = (ax, ay);
    }
    sum
}

/// Is the diagonal from `a` towards `b` inside the polygon in the immediate
/// neighborhood of `a`? The test splits on whether `a` is convex: at a
/// convex corner `b` must fall inside the corner's wedge, at a reflex corner
/// outside the complementary wedge.
pub(crate) fn locally_inside<T: Float>(store: &RingStore<T>, a: NodeId, b: NodeId) -> bool {
    let a_prev = &store[store[a].prev];
    let a_next = &store[store[a].next];
    let an = &store[a];
    let bn = &store[b];

    if tri_area(a_prev, an, a_next) < T::zero() {
        tri_area(an, bn, a_next) >= T::zero() && tri_area(an, a_prev, bn) >= T::zero()
    } else {
        tri_area(an, bn, a_prev) < T::zero() || tri_area(an, a_next, bn) < T::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(pts: &[[f64; 2]]) -> (RingStore<f64>, NodeId) {
        let mut store = RingStore::new();
        let mut last = None;
        for (i, &[x, y]) in pts.iter().enumerate() {
            last = Some(store.insert_after(i as u32, x, y, last));
        }
        let first = store[last.unwrap()].next;
        (store, first)
    }

    fn nth(store: &RingStore<f64>, first: NodeId, n: usize) -> NodeId {
        let mut id = first;
        for _ in 0..n {
            id = store[id].next;
        }
        id
    }

    #[test]
    fn tri_area_sign_tracks_winding() {
        let (store, first) = store_with(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let a = first;
        let b = store[a].next;
        let c = store[b].next;
        let ccw = tri_area(&store[a], &store[b], &store[c]);
        let cw = tri_area(&store[c], &store[b], &store[a]);
        assert!(ccw < 0.0);
        assert!(cw > 0.0);
        assert_eq!(ccw, -cw);
    }

    #[test]
    fn point_in_triangle_includes_the_boundary() {
        // triangle (0,0) (4,0) (0,4)
        assert!(point_in_triangle(0.0, 0.0, 4.0, 0.0, 0.0, 4.0, 1.0, 1.0));
        assert!(point_in_triangle(0.0, 0.0, 4.0, 0.0, 0.0, 4.0, 2.0, 0.0));
        assert!(point_in_triangle(0.0, 0.0, 4.0, 0.0, 0.0, 4.0, 0.0, 0.0));
        assert!(!point_in_triangle(0.0, 0.0, 4.0, 0.0, 0.0, 4.0, 3.0, 3.0));
        assert!(!point_in_triangle(0.0, 0.0, 4.0, 0.0, 0.0, 4.0, -0.1, 1.0));
    }

    #[test]
    fn crossing_touching_and_disjoint_segments() {
        let (store, first) = store_with(&[
            [0.0, 0.0],
            [4.0, 4.0],
            [0.0, 4.0],
            [4.0, 0.0],
            [2.0, 2.0],
            [8.0, 8.0],
            [5.0, 0.0],
            [6.0, 1.0],
        ]);
        let p = |n| &store[nth(&store, first, n)];

        // proper crossing
        assert!(segments_intersect(p(0), p(1), p(2), p(3)));
        // collinear overlap and endpoint touch
        assert!(segments_intersect(p(0), p(1), p(4), p(5)));
        assert!(segments_intersect(p(0), p(1), p(1), p(3)));
        // disjoint
        assert!(!segments_intersect(p(0), p(1), p(6), p(7)));
    }

    #[test]
    fn ring_area_sign_flips_with_direction() {
        // unit square, counter-clockwise by conventional shoelace
        let ccw = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let cw = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        let a = ring_area(&ccw, 0, 4);
        let b = ring_area(&cw, 0, 4);
        assert_eq!(a, -b);
        assert!(a > 0.0);
    }
}
