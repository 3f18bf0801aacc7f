//! Morton-code (z-order curve) index over the ring.
//!
//! Above the activation threshold the ear test walks a second linked chain
//! sorted by Morton code instead of the whole ring, so candidate interior
//! points are visited roughly nearest-first and the scan can stop as soon as
//! the codes leave the ear's bounding-box range.

use num_traits::float::Float;

use crate::ring::{NodeId, RingStore};

/// Scale frame mapping coordinates onto the 15-bit Morton grid.
#[derive(Clone, Copy)]
pub(crate) struct MortonGrid<T> {
    min_x: T,
    min_y: T,
    inv_size: T,
}

impl<T: Float> MortonGrid<T> {
    /// Frame covering the outer ring's bounding box. `None` when the box is
    /// degenerate, in which case indexing is skipped regardless of size.
    pub fn from_outer_ring(coords: &[T], outer_len: usize) -> Option<Self> {
        if outer_len == 0 {
            return None;
        }
        let (mut min_x, mut min_y) = (coords[0], coords[1]);
        let (mut max_x, mut max_y) = (min_x, min_y);
        for v in 1..outer_len {
            let (x, y) = (coords[2 * v], coords[2 * v + 1]);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let size = (max_x - min_x).max(max_y - min_y);
        if size == T::zero() {
            return None;
        }
        Some(Self {
            min_x,
            min_y,
            inv_size: T::from(32767.0).unwrap() / size,
        })
    }

    /// Morton code of a point. Points outside the frame (possible for holes
    /// reaching past the outer ring) collapse to the origin cell rather than
    /// failing; they only cost query time.
    pub fn code(&self, x: T, y: T) -> i32 {
        let x = ((x - self.min_x) * self.inv_size).to_u32().unwrap_or(0);
        let y = ((y - self.min_y) * self.inv_size).to_u32().unwrap_or(0);
        interleave(x, y)
    }
}

/// Bit-interleave two 15-bit values: x on even bits, y on odd.
fn interleave(x: u32, y: u32) -> i32 {
    let mut xy = (x as i64) << 32 | y as i64;
    xy = (xy | (xy << 8)) & 0x00FF00FF00FF00FF;
    xy = (xy | (xy << 4)) & 0x0F0F0F0F0F0F0F0F;
    xy = (xy | (xy << 2)) & 0x3333333333333333;
    xy = (xy | (xy << 1)) & 0x5555555555555555;
    (xy >> 32 | xy << 1) as i32
}

/// Compute missing Morton codes, seed the z-chain in ring order, break its
/// circularity and sort it.
pub(crate) fn build_index<T: Float>(store: &mut RingStore<T>, start: NodeId, grid: &MortonGrid<T>) {
    let mut p = start;
    loop {
        if store[p].z == 0 {
            let (x, y) = (store[p].x, store[p].y);
            store[p].z = grid.code(x, y);
        }
        let (prev, next) = (store[p].prev, store[p].next);
        store[p].prev_z = Some(prev);
        store[p].next_z = Some(next);
        p = next;
        if p == start {
            break;
        }
    }

    let tail = store[start].prev_z.take().unwrap();
    store[tail].next_z = None;

    sort_by_code(store, start);
}

/// Bottom-up (iterative doubling) merge sort over the z-chain; Simon
/// Tatham's linked-list algorithm. Stable, in place, O(n log n) without an
/// auxiliary index array, which matters because the ring keeps mutating
/// while the chain is alive.
/// <http://www.chiark.greenend.org.uk/~sgtatham/algorithms/listsort.html>
fn sort_by_code<T: Float>(store: &mut RingStore<T>, head: NodeId) {
    let mut width = 1usize;
    let mut head = Some(head);

    loop {
        let mut p = head;
        head = None;
        let mut tail: Option<NodeId> = None;
        let mut merges = 0usize;

        while let Some(p_start) = p {
            merges += 1;

            // measure a run of up to `width` nodes; q ends just past it
            let mut q = Some(p_start);
            let mut p_len = 0usize;
            while p_len < width {
                p_len += 1;
                q = store[q.unwrap()].next_z;
                if q.is_none() {
                    break;
                }
            }
            let mut q_len = width;

            while p_len > 0 || (q_len > 0 && q.is_some()) {
                let take_p = if p_len == 0 {
                    false
                } else if q_len == 0 || q.is_none() {
                    true
                } else {
                    store[p.unwrap()].z <= store[q.unwrap()].z
                };

                let e = if take_p {
                    let e = p.unwrap();
                    p = store[e].next_z;
                    p_len -= 1;
                    e
                } else {
                    let e = q.unwrap();
                    q = store[e].next_z;
                    q_len -= 1;
                    e
                };

                if let Some(t) = tail {
                    store[t].next_z = Some(e);
                } else {
                    head = Some(e);
                }
                store[e].prev_z = tail;
                tail = Some(e);
            }

            p = q;
        }

        store[tail.unwrap()].next_z = None;
        if merges <= 1 {
            return;
        }
        width *= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_spreads_bits() {
        assert_eq!(interleave(0, 0), 0);
        assert_eq!(interleave(1, 0), 0b01);
        assert_eq!(interleave(0, 1), 0b10);
        assert_eq!(interleave(1, 1), 0b11);
        assert_eq!(interleave(3, 5), 0b100111);
        assert_eq!(interleave(32767, 32767), 0x3FFFFFFF);
    }

    #[test]
    fn grid_rejects_degenerate_boxes() {
        let collapsed = [3.0f64, 1.0, 3.0, 1.0, 3.0, 1.0];
        assert!(MortonGrid::from_outer_ring(&collapsed, 3).is_none());

        let square = [0.0f64, 0.0, 8.0, 0.0, 8.0, 8.0, 0.0, 8.0];
        let grid = MortonGrid::from_outer_ring(&square, 4).unwrap();
        assert_eq!(grid.code(0.0, 0.0), 0);
        assert!(grid.code(8.0, 8.0) > grid.code(0.0, 0.0));
    }

    #[test]
    fn build_index_yields_an_ascending_chain() {
        let mut store = RingStore::new();
        let pts: [[f64; 2]; 8] = [
            [7.0, 2.0],
            [1.0, 6.0],
            [5.0, 5.0],
            [0.0, 1.0],
            [6.0, 0.0],
            [2.0, 3.0],
            [4.0, 7.0],
            [3.0, 4.0],
        ];
        let mut last = None;
        for (i, &[x, y]) in pts.iter().enumerate() {
            last = Some(store.insert_after(i as u32, x, y, last));
        }
        let start = store[last.unwrap()].next;
        let grid = MortonGrid::from_outer_ring(
            &[0.0, 0.0, 7.0, 0.0, 7.0, 7.0, 0.0, 7.0],
            4,
        )
        .unwrap();

        build_index(&mut store, start, &grid);

        // find the chain head, then check ordering and length
        let mut head = start;
        while let Some(prev) = store[head].prev_z {
            head = prev;
        }
        let mut seen = 1;
        let mut p = head;
        while let Some(next) = store[p].next_z {
            assert!(store[p].z <= store[next].z, "chain out of order");
            assert_eq!(store[next].prev_z, Some(p));
            p = next;
            seen += 1;
        }
        assert_eq!(seen, pts.len());
    }
}
