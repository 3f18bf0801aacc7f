//! Merging hole rings into the outer boundary.
//!
//! Each hole is joined to the outer ring through a bridge edge so that the
//! clipper only ever sees one ring. Holes are processed left to right; the
//! bridge endpoint on the outer ring is found with David Eberly's
//! visibility construction (leftward ray cast, then a minimum-angle
//! refinement over vertices that could occlude the candidate).

use alloc::vec::Vec;
use core::cmp::Ordering;

use num_traits::float::Float;

use crate::geom::{locally_inside, point_in_triangle, tri_area};
use crate::ring::{build_ring, prune_degenerates, NodeId, RingStore};

/// Link every hole into the outer ring, producing a single ring without
/// holes. `hole_starts` are vertex offsets, already validated; `queue` is a
/// caller-owned scratch buffer.
pub(crate) fn merge_holes<T: Float>(
    store: &mut RingStore<T>,
    coords: &[T],
    hole_starts: &[usize],
    vertex_count: usize,
    mut outer: NodeId,
    queue: &mut Vec<NodeId>,
) -> NodeId {
    queue.clear();
    for (k, &start) in hole_starts.iter().enumerate() {
        let end = if k + 1 < hole_starts.len() {
            hole_starts[k + 1]
        } else {
            vertex_count
        };
        if let Some(ring) = build_ring(store, coords, start, end, false) {
            if store[ring].next == ring {
                // a lone point is a steiner vertex, not a ring
                store[ring].bridge = true;
            }
            queue.push(leftmost(store, ring));
        }
    }

    queue.sort_unstable_by(|&a, &b| {
        store[a]
            .x
            .partial_cmp(&store[b].x)
            .unwrap_or(Ordering::Equal)
    });

    for &hole in queue.iter() {
        outer = bridge_hole(store, hole, outer);
    }

    outer
}

/// Splice one hole into the outer ring and clean up around both cuts.
fn bridge_hole<T: Float>(store: &mut RingStore<T>, hole: NodeId, outer: NodeId) -> NodeId {
    let Some(anchor) = find_bridge_anchor(store, hole, outer) else {
        // no visible vertex; the hole is dropped
        return outer;
    };
    let mirrored = store.split_ring(anchor, hole);

    let end = Some(store[mirrored].next);
    prune_degenerates(store, mirrored, end);
    let end = Some(store[anchor].next);
    prune_degenerates(store, anchor, end)
}

/// Outer-ring vertex a bridge from `hole` can connect to without crossing
/// the boundary.
fn find_bridge_anchor<T: Float>(
    store: &RingStore<T>,
    hole: NodeId,
    outer: NodeId,
) -> Option<NodeId> {
    let (hx, hy) = (store[hole].x, store[hole].y);
    let mut qx = T::neg_infinity();
    let mut anchor: Option<NodeId> = None;

    // cast a ray from the hole's leftmost point towards negative x; the
    // endpoint with lesser x of the nearest intersected segment is the
    // candidate connection point
    let mut p = outer;
    loop {
        let pn = store[p].next;
        let (px, py) = (store[p].x, store[p].y);
        let (nx, ny) = (store[pn].x, store[pn].y);
        if hy <= py && hy >= ny && ny != py {
            let x = px + (hy - py) * (nx - px) / (ny - py);
            if x <= hx && x > qx {
                qx = x;
                anchor = Some(if px < nx { p } else { pn });
                if x == hx {
                    // the ray touches the segment endpoint itself
                    return anchor;
                }
            }
        }
        p = pn;
        if p == outer {
            break;
        }
    }

    let mut m = anchor?;
    let stop = m;
    let (mx, my) = (store[m].x, store[m].y);
    let mut tan_min = T::infinity();

    // the sector between the hole point and the ray hit may contain other
    // vertices; if so, connect to the one with the minimum angle to the ray
    // (and of those, the closest or the one whose sector encloses the other)
    let mut p = m;
    loop {
        let (px, py) = (store[p].x, store[p].y);
        if (hx >= px && px >= mx && hx != px)
            && point_in_triangle(
                if hy < my { hx } else { qx },
                hy,
                mx,
                my,
                if hy < my { qx } else { hx },
                hy,
                px,
                py,
            )
        {
            let tan = (hy - py).abs() / (hx - px);
            if locally_inside(store, p, hole)
                && (tan < tan_min
                    || (tan == tan_min
                        && (px > store[m].x
                            || (px == store[m].x && wedge_contains(store, m, p)))))
            {
                m = p;
                tan_min = tan;
            }
        }

        p = store[p].next;
        if p == stop {
            return Some(m);
        }
    }
}

/// Whether the angular sector at `m` encloses the sector at `p`, for two
/// vertices at the same position.
fn wedge_contains<T: Float>(store: &RingStore<T>, m: NodeId, p: NodeId) -> bool {
    tri_area(&store[store[m].prev], &store[m], &store[store[p].prev]) < T::zero()
        && tri_area(&store[store[p].next], &store[m], &store[store[m].next]) < T::zero()
}

/// Leftmost node of a ring, ties broken towards the bottom.
fn leftmost<T: Float>(store: &RingStore<T>, start: NodeId) -> NodeId {
    let mut best = start;
    let mut p = store[start].next;
    while p != start {
        let (px, py) = (store[p].x, store[p].y);
        let (bx, by) = (store[best].x, store[best].y);
        if px < bx || (px == bx && py < by) {
            best = p;
        }
        p = store[p].next;
    }
    best
}
