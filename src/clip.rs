//! The ear-clipping loop and its escalating fallbacks.
//!
//! The clipper walks the ring looking for an ear: a convex vertex whose
//! triangle contains no other ring vertex. Each ear is emitted and its tip
//! unlinked. When a full lap finds nothing, the ring is degenerate or
//! self-intersecting and the pass escalates: re-filter, then repair local
//! crossings, then split the polygon and start over on each half. A ring no
//! fallback can crack is abandoned without error; its vertices simply
//! produce no triangles.

use alloc::vec::Vec;

use num_traits::float::Float;

use crate::geom::{
    locally_inside, point_in_triangle, same_pos, segments_intersect, tri_area,
};
use crate::ring::{prune_degenerates, NodeId, RingStore};
use crate::zorder::{build_index, MortonGrid};
use crate::VertexIndex;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    /// plain scan over the ring as built
    Scan,
    /// after re-filtering degenerate points
    Filtered,
    /// after curing local self-intersections
    Repaired,
}

/// Triangulate one ring. Recurses with the next `Pass` on a stalled lap and
/// re-enters at `Pass::Scan` for each half produced by a split.
pub(crate) fn clip_ears<T: Float, N: VertexIndex>(
    store: &mut RingStore<T>,
    start: NodeId,
    out: &mut Vec<N>,
    grid: Option<MortonGrid<T>>,
    pass: Pass,
) {
    let mut ear = start;

    if pass == Pass::Scan {
        if let Some(grid) = &grid {
            build_index(store, ear, grid);
        }
    }

    let mut stop = ear;
    loop {
        if store[ear].prev == store[ear].next {
            break;
        }
        let prev = store[ear].prev;
        let next = store[ear].next;

        let found = match &grid {
            Some(grid) => is_ear_indexed(store, ear, grid),
            None => is_ear(store, ear),
        };
        if found {
            let after = store[next].next;

            out.push(N::from_usize(store[prev].vertex as usize));
            out.push(N::from_usize(store[ear].vertex as usize));
            out.push(N::from_usize(store[next].vertex as usize));

            store.unlink(ear);

            // skipping one vertex produces fewer sliver triangles
            (ear, stop) = (after, after);
            continue;
        }

        ear = next;

        if ear == stop {
            // a whole lap without an ear; escalate
            match pass {
                Pass::Scan => {
                    let pruned = prune_degenerates(store, ear, None);
                    clip_ears(store, pruned, out, grid, Pass::Filtered);
                }
                Pass::Filtered => {
                    let pruned = prune_degenerates(store, ear, None);
                    let repaired = repair_local_crossings(store, pruned, out);
                    clip_ears(store, repaired, out, grid, Pass::Repaired);
                }
                Pass::Repaired => {
                    split_and_clip(store, ear, out, grid);
                }
            }
            return;
        }
    }
}

/// Plain ear test: convex corner, no other ring vertex inside the triangle.
fn is_ear<T: Float>(store: &RingStore<T>, ear: NodeId) -> bool {
    let b = &store[ear];
    let a_id = b.prev;
    let c_id = b.next;
    let a = &store[a_id];
    let c = &store[c_id];

    if tri_area(a, b, c) >= T::zero() {
        // reflex or degenerate corner
        return false;
    }

    let x0 = a.x.min(b.x.min(c.x));
    let y0 = a.y.min(b.y.min(c.y));
    let x1 = a.x.max(b.x.max(c.x));
    let y1 = a.y.max(b.y.max(c.y));

    let mut p = c.next;
    while p != a_id {
        let n = &store[p];
        let next = n.next;
        if (n.x >= x0 && n.x <= x1 && n.y >= y0 && n.y <= y1)
            && point_in_triangle(a.x, a.y, b.x, b.y, c.x, c.y, n.x, n.y)
            && tri_area(&store[n.prev], n, &store[next]) >= T::zero()
        {
            return false;
        }
        p = next;
    }
    true
}

/// Indexed ear test: same acceptance rule, but candidates come from the
/// Morton chain, walked outward from the ear while their codes stay within
/// the triangle bbox's code range (both directions first, then each
/// remaining tail).
fn is_ear_indexed<T: Float>(store: &RingStore<T>, ear: NodeId, grid: &MortonGrid<T>) -> bool {
    let b = &store[ear];
    let a_id = b.prev;
    let c_id = b.next;
    let a = &store[a_id];
    let c = &store[c_id];

    if tri_area(a, b, c) >= T::zero() {
        return false;
    }

    let x0 = a.x.min(b.x.min(c.x));
    let y0 = a.y.min(b.y.min(c.y));
    let x1 = a.x.max(b.x.max(c.x));
    let y1 = a.y.max(b.y.max(c.y));

    let min_z = grid.code(x0, y0);
    let max_z = grid.code(x1, y1);

    let blocks = |id: NodeId| -> bool {
        let n = &store[id];
        id != a_id
            && id != c_id
            && (n.x >= x0 && n.x <= x1 && n.y >= y0 && n.y <= y1)
            && point_in_triangle(a.x, a.y, b.x, b.y, c.x, c.y, n.x, n.y)
            && tri_area(&store[n.prev], n, &store[n.next]) >= T::zero()
    };

    let mut back = b.prev_z;
    let mut fwd = b.next_z;

    loop {
        let Some(p) = back else { break };
        if store[p].z < min_z {
            break;
        }
        let Some(n) = fwd else { break };
        if store[n].z > max_z {
            break;
        }

        if blocks(p) {
            return false;
        }
        back = store[p].prev_z;

        if blocks(n) {
            return false;
        }
        fwd = store[n].next_z;
    }

    while let Some(p) = back {
        if store[p].z < min_z {
            break;
        }
        if blocks(p) {
            return false;
        }
        back = store[p].prev_z;
    }

    while let Some(n) = fwd {
        if store[n].z > max_z {
            break;
        }
        if blocks(n) {
            return false;
        }
        fwd = store[n].next_z;
    }

    true
}

/// Fix "bowtie" crossings between edges two apart: when segment (a, p)
/// crosses (p.next, b), the quadrilateral pinches through itself; emitting
/// (a, p, b) and dropping the two pinch vertices restores a simple ring.
fn repair_local_crossings<T: Float, N: VertexIndex>(
    store: &mut RingStore<T>,
    start: NodeId,
    out: &mut Vec<N>,
) -> NodeId {
    let mut start = start;
    let mut p = start;
    loop {
        let a = store[p].prev;
        let p_next = store[p].next;
        let b = store[p_next].next;

        if !same_pos(&store[a], &store[b])
            && segments_intersect(&store[a], &store[p], &store[p_next], &store[b])
            && locally_inside(store, a, b)
            && locally_inside(store, b, a)
        {
            out.push(N::from_usize(store[a].vertex as usize));
            out.push(N::from_usize(store[p].vertex as usize));
            out.push(N::from_usize(store[b].vertex as usize));

            store.unlink(p);
            store.unlink(p_next);

            (p, start) = (b, b);
        }

        p = store[p].next;
        if p == start {
            return prune_degenerates(store, p, None);
        }
    }
}

/// Last resort: find a valid diagonal, split the ring through it and clip
/// each half from scratch. Gives up silently when no pair of vertices forms
/// a valid diagonal.
fn split_and_clip<T: Float, N: VertexIndex>(
    store: &mut RingStore<T>,
    start: NodeId,
    out: &mut Vec<N>,
    grid: Option<MortonGrid<T>>,
) {
    let mut a = start;
    loop {
        let a_prev = store[a].prev;
        let a_next = store[a].next;

        let mut b = store[a_next].next;
        while b != a_prev {
            if store[a].vertex != store[b].vertex && is_valid_diagonal(store, a, b) {
                let mut c = store.split_ring(a, b);

                let end = Some(store[a].next);
                let a = prune_degenerates(store, a, end);
                let end = Some(store[c].next);
                c = prune_degenerates(store, c, end);

                clip_ears(store, a, out, grid, Pass::Scan);
                clip_ears(store, c, out, grid, Pass::Scan);
                return;
            }
            b = store[b].next;
        }

        a = store[a].next;
        if a == start {
            return;
        }
    }
}

/// A diagonal is valid when it stays strictly interior: it must not ride an
/// existing edge, cross the boundary, or leave the polygon at either
/// endpoint, its midpoint must be inside, and it must not slice the ring
/// into two oppositely wound halves. Two coincident vertices may still form
/// a (zero-length) diagonal when both corners are convex.
fn is_valid_diagonal<T: Float>(store: &RingStore<T>, a: NodeId, b: NodeId) -> bool {
    let a_prev = store[a].prev;
    let a_next = store[a].next;
    let b_prev = store[b].prev;
    let b_next = store[b].next;

    (store[a_next].vertex != store[b].vertex
        && store[a_prev].vertex != store[b].vertex
        && !crosses_ring(store, a, b))
        && (locally_inside(store, a, b)
            && locally_inside(store, b, a)
            && midpoint_inside(store, a, b)
            && (tri_area(&store[a_prev], &store[a], &store[b_prev]) != T::zero()
                || tri_area(&store[a], &store[b_prev], &store[b]) != T::zero())
            || same_pos(&store[a], &store[b])
                && tri_area(&store[a_prev], &store[a], &store[a_next]) > T::zero()
                && tri_area(&store[b_prev], &store[b], &store[b_next]) > T::zero())
}

/// Does the open diagonal a-b cross any ring edge not incident to either
/// endpoint?
fn crosses_ring<T: Float>(store: &RingStore<T>, a: NodeId, b: NodeId) -> bool {
    let (av, bv) = (store[a].vertex, store[b].vertex);
    let mut p = a;
    loop {
        let next = store[p].next;
        if store[p].vertex != av
            && store[p].vertex != bv
            && store[next].vertex != av
            && store[next].vertex != bv
            && segments_intersect(&store[p], &store[next], &store[a], &store[b])
        {
            return true;
        }
        p = next;
        if p == a {
            return false;
        }
    }
}

/// Even-odd ray cast for the diagonal's midpoint against the full ring.
fn midpoint_inside<T: Float>(store: &RingStore<T>, a: NodeId, b: NodeId) -> bool {
    let two = T::one() + T::one();
    let mx = (store[a].x + store[b].x) / two;
    let my = (store[a].y + store[b].y) / two;

    let mut inside = false;
    let mut p = a;
    loop {
        let next = store[p].next;
        let (px, py) = (store[p].x, store[p].y);
        let (nx, ny) = (store[next].x, store[next].y);
        if ((py > my) != (ny > my)) && ny != py && (mx < (nx - px) * (my - py) / (ny - py) + px) {
            inside = !inside;
        }
        p = next;
        if p == a {
            return inside;
        }
    }
}
