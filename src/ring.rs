//! Node arena and the circular ring built over it.
//!
//! Ring membership is expressed through `prev`/`next` handles into a
//! contiguous arena rather than owned pointers; unlinking a node is O(1) and
//! never frees it, so handles stay valid for the whole triangulation call.

use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use num_traits::float::Float;

use crate::geom::{ring_area, same_pos, tri_area};

/// Stable handle to a node in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct NodeId(u32);

pub(crate) struct Node<T> {
    /// vertex number (pair index) in the original input, kept verbatim for
    /// the output triangles
    pub vertex: u32,
    pub x: T,
    pub y: T,
    /// cached Morton code; 0 until computed
    pub z: i32,
    /// ring links; always a consistent circular list while the node is live
    pub prev: NodeId,
    pub next: NodeId,
    /// Morton-ordered chain, None-terminated at both ends
    pub prev_z: Option<NodeId>,
    pub next_z: Option<NodeId>,
    /// synthetic vertex (lone hole point or split bridge)
    pub bridge: bool,
}

impl<T> Node<T> {
    fn new(vertex: u32, x: T, y: T, prev: NodeId, next: NodeId) -> Self {
        Self {
            vertex,
            x,
            y,
            z: 0,
            prev,
            next,
            prev_z: None,
            next_z: None,
            bridge: false,
        }
    }
}

pub(crate) struct RingStore<T> {
    nodes: Vec<Node<T>>,
}

impl<T: Float> RingStore<T> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn reset(&mut self, capacity: usize) {
        self.nodes.clear();
        self.nodes.reserve(capacity);
    }

    /// Append a node, linking it directly after `after` (or self-linked when
    /// starting a fresh ring).
    pub fn insert_after(&mut self, vertex: u32, x: T, y: T, after: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        match after {
            Some(prev) => {
                let next = self[prev].next;
                self[prev].next = id;
                self[next].prev = id;
                self.nodes.push(Node::new(vertex, x, y, prev, next));
            }
            None => self.nodes.push(Node::new(vertex, x, y, id, id)),
        }
        id
    }

    /// Take a node out of the ring and out of the Morton chain. The node
    /// itself stays in the arena; its own links are left untouched.
    pub fn unlink(&mut self, id: NodeId) -> (NodeId, NodeId) {
        let (prev, next, prev_z, next_z) = {
            let n = &self[id];
            (n.prev, n.next, n.prev_z, n.next_z)
        };
        self[next].prev = prev;
        self[prev].next = next;
        if let Some(pz) = prev_z {
            self[pz].next_z = next_z;
        }
        if let Some(nz) = next_z {
            self[nz].prev_z = prev_z;
        }
        (prev, next)
    }

    /// Connect `a` and `b` through two freshly created twin nodes carrying
    /// the same coordinates and vertex numbers. On a single ring this splits
    /// it in two; between an outer ring and a hole it merges them into one.
    /// Returns the twin of `b`, which lies on the ring not containing `a`.
    pub fn split_ring(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let a2 = NodeId(self.nodes.len() as u32);
        let b2 = NodeId(self.nodes.len() as u32 + 1);

        let (ax, ay, av, an) = {
            let n = &self[a];
            (n.x, n.y, n.vertex, n.next)
        };
        let (bx, by, bv, bp) = {
            let n = &self[b];
            (n.x, n.y, n.vertex, n.prev)
        };

        self[a].next = b;
        self[b].prev = a;
        self[an].prev = a2;
        self[bp].next = b2;

        self.nodes.push(Node::new(av, ax, ay, b2, an));
        self.nodes.push(Node::new(bv, bx, by, bp, a2));

        b2
    }
}

impl<T> Index<NodeId> for RingStore<T> {
    type Output = Node<T>;

    fn index(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0 as usize]
    }
}

impl<T> IndexMut<NodeId> for RingStore<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.0 as usize]
    }
}

/// Build a circular ring over the vertex range `start..end` of the flat
/// coordinate buffer, traversed in whichever direction yields the requested
/// winding. Returns a handle to one node on the ring.
pub(crate) fn build_ring<T: Float>(
    store: &mut RingStore<T>,
    coords: &[T],
    start: usize,
    end: usize,
    clockwise: bool,
) -> Option<NodeId> {
    let mut last: Option<NodeId> = None;

    if clockwise == (ring_area(coords, start, end) > T::zero()) {
        for v in start..end {
            last = Some(store.insert_after(v as u32, coords[2 * v], coords[2 * v + 1], last));
        }
    } else {
        for v in (start..end).rev() {
            last = Some(store.insert_after(v as u32, coords[2 * v], coords[2 * v + 1], last));
        }
    }

    // drop a closing point that duplicates the opening one
    if let Some(tail) = last {
        let head = store[tail].next;
        if same_pos(&store[tail], &store[head]) {
            let (_, next) = store.unlink(tail);
            last = Some(next);
        }
    }

    last
}

/// Remove duplicate and collinear points from the ring, starting at `start`
/// and stopping at `end` (defaults to a full lap). Every removal steps back
/// to the predecessor so newly exposed degeneracies are caught in the same
/// walk. Bridge points are kept through the collinear rule but still go when
/// they exactly duplicate their successor.
pub(crate) fn prune_degenerates<T: Float>(
    store: &mut RingStore<T>,
    start: NodeId,
    end: Option<NodeId>,
) -> NodeId {
    let mut end = end.unwrap_or(start);

    let mut p = start;
    loop {
        let next = store[p].next;
        let duplicate = same_pos(&store[p], &store[next]);
        let collinear = !store[p].bridge
            && tri_area(&store[store[p].prev], &store[p], &store[next]) == T::zero();

        if duplicate || collinear {
            let (prev, after) = store.unlink(p);
            (p, end) = (prev, prev);
            if p == after {
                return end;
            }
        } else {
            p = next;
            if p == end {
                return end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_of(store: &mut RingStore<f64>, pts: &[[f64; 2]]) -> NodeId {
        let mut last = None;
        for (i, &[x, y]) in pts.iter().enumerate() {
            last = Some(store.insert_after(i as u32, x, y, last));
        }
        last.unwrap()
    }

    fn assert_consistent(store: &RingStore<f64>, start: NodeId, expected_len: usize) {
        let mut p = start;
        let mut n = 0;
        loop {
            assert_eq!(store[store[p].next].prev, p);
            assert_eq!(store[store[p].prev].next, p);
            n += 1;
            p = store[p].next;
            if p == start {
                break;
            }
            assert!(n <= expected_len, "ring longer than expected");
        }
        assert_eq!(n, expected_len);
    }

    #[test]
    fn insert_and_unlink_keep_the_ring_circular() {
        let mut store = RingStore::new();
        let tail = ring_of(&mut store, &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert_consistent(&store, tail, 4);

        let (prev, next) = store.unlink(tail);
        assert_consistent(&store, next, 3);
        assert_eq!(store[prev].next, next);
    }

    #[test]
    fn split_ring_duplicates_both_endpoints() {
        let mut store = RingStore::new();
        let tail = ring_of(
            &mut store,
            &[
                [0.0, 0.0],
                [4.0, 0.0],
                [4.0, 4.0],
                [2.0, 2.0],
                [0.0, 4.0],
            ],
        );
        let a = store[tail].next; // vertex 0
        let b = store[store[store[a].next].next].next; // vertex 3

        let b2 = store.split_ring(a, b);
        // one half is 0-3-4, the other (through the twins) 3-0-1-2
        assert_consistent(&store, a, 3);
        assert_consistent(&store, b2, 4);
        assert_eq!(store[b2].vertex, 3);
        assert_eq!(store[store[b2].next].vertex, 0);
    }

    #[test]
    fn prune_removes_duplicates_and_collinear_runs() {
        let mut store = RingStore::new();
        // a square with a repeated corner and a point in the middle of an edge
        let tail = ring_of(
            &mut store,
            &[
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 0.0],
                [2.0, 0.0],
                [2.0, 2.0],
                [0.0, 2.0],
            ],
        );
        let start = prune_degenerates(&mut store, tail, None);
        assert_consistent(&store, start, 4);
    }

    #[test]
    fn prune_spares_collinear_bridge_points() {
        let mut store = RingStore::new();
        let tail = ring_of(
            &mut store,
            &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]],
        );
        // flag the collinear edge midpoint (vertex 1) as a bridge point
        let flagged = store[store[tail].next].next;
        assert_eq!(store[flagged].vertex, 1);
        store[flagged].bridge = true;

        let start = prune_degenerates(&mut store, tail, None);
        assert_consistent(&store, start, 5);
    }
}
