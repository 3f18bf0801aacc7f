//! Ear-clipping triangulation of simple polygons with holes.
//!
//! Turns a flat coordinate buffer (one outer ring followed by optional hole
//! rings) into triangle indices suitable for rasterization, using the
//! earcut family of heuristics: winding-normalized linked rings, hole
//! bridging, a Morton-code index for large inputs, and escalating repair
//! passes for degenerate or self-intersecting geometry.

#![no_std]

extern crate alloc;

mod clip;
mod geom;
mod holes;
mod ring;
mod zorder;

use alloc::vec::Vec;
use core::fmt;

use num_traits::float::Float;

use clip::{clip_ears, Pass};
use holes::merge_holes;
use ring::{build_ring, NodeId, RingStore};
use zorder::MortonGrid;

/// Ring size above which the Morton-code index is built. Below it a linear
/// scan per candidate ear is cheaper than maintaining the index.
pub const SPATIAL_INDEX_THRESHOLD: usize = 80;

/// Output vertex index.
pub trait VertexIndex: Copy {
    fn into_usize(self) -> usize;
    fn from_usize(v: usize) -> Self;
}

impl VertexIndex for u16 {
    fn into_usize(self) -> usize {
        self as usize
    }
    fn from_usize(v: usize) -> Self {
        v as Self
    }
}

impl VertexIndex for u32 {
    fn into_usize(self) -> usize {
        self as usize
    }
    fn from_usize(v: usize) -> Self {
        v as Self
    }
}

impl VertexIndex for usize {
    fn into_usize(self) -> usize {
        self
    }
    fn from_usize(v: usize) -> Self {
        v
    }
}

/// Rejected input buffers. Malformed *geometry* is never an error; the
/// triangulation degrades to partial or empty output instead.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputError {
    /// The flat coordinate buffer has an odd number of slots; every vertex
    /// must occupy exactly two.
    UnpairedCoordinate { slots: usize },
    /// A coordinate is NaN or infinite. Morton codes and signed-area
    /// comparisons are undefined for non-finite values.
    NonFiniteCoordinate { slot: usize },
    /// A hole offset points past the end of the input or before the
    /// preceding hole.
    HoleOutOfRange {
        hole: usize,
        start: usize,
        vertices: usize,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            InputError::UnpairedCoordinate { slots } => {
                write!(f, "flat coordinate buffer has odd length {slots}")
            }
            InputError::NonFiniteCoordinate { slot } => {
                write!(f, "non-finite coordinate at slot {slot}")
            }
            InputError::HoleOutOfRange {
                hole,
                start,
                vertices,
            } => write!(
                f,
                "hole {hole} starts at vertex {start}, outside the {vertices}-vertex input"
            ),
        }
    }
}

impl core::error::Error for InputError {}

/// Reusable triangulator.
///
/// One instance owns the node arena and scratch buffers, so running many
/// triangulations through the same instance amortizes allocations.
pub struct Triangulator<T: Float> {
    store: RingStore<T>,
    hole_queue: Vec<NodeId>,
    hole_starts: Vec<usize>,
    spatial_threshold: usize,
}

impl<T: Float> Default for Triangulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Triangulator<T> {
    pub fn new() -> Self {
        Self::with_spatial_index_threshold(SPATIAL_INDEX_THRESHOLD)
    }

    /// Like [`Triangulator::new`], but with a custom vertex count above
    /// which the Morton-code index kicks in. `0` forces the index on,
    /// `usize::MAX` forces the linear scan; both paths produce the same
    /// triangle count and coverage.
    pub fn with_spatial_index_threshold(threshold: usize) -> Self {
        Self {
            store: RingStore::new(),
            hole_queue: Vec::new(),
            hole_starts: Vec::new(),
            spatial_threshold: threshold,
        }
    }

    /// Triangulate a polygon given as flat coordinate pairs.
    ///
    /// `coords` holds the outer ring first, then each hole ring;
    /// `hole_starts` gives the vertex (pair) offset where each hole begins.
    /// `out` is cleared and filled with triples of 0-based vertex indices
    /// into `coords`; triangle winding matches the input ring's effective
    /// orientation.
    ///
    /// Degenerate, self-intersecting or otherwise broken geometry yields
    /// partial or empty output rather than an error. Only structurally
    /// invalid buffers are rejected (see [`InputError`]).
    ///
    /// Repair passes and polygon splitting recurse; stack depth is bounded
    /// by the vertex count, so callers feeding adversarial inputs on small
    /// stacks should bound the input size themselves.
    ///
    /// ```
    /// let mut triangulator = polycut::Triangulator::new();
    /// let square = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    /// let mut triangles: Vec<u32> = Vec::new();
    /// triangulator.triangulate(&square, &[], &mut triangles).unwrap();
    /// assert_eq!(triangles.len(), 6);
    /// ```
    pub fn triangulate<N: VertexIndex>(
        &mut self,
        coords: &[T],
        hole_starts: &[N],
        out: &mut Vec<N>,
    ) -> Result<(), InputError> {
        out.clear();
        self.check_input(coords, hole_starts)?;

        let vertices = coords.len() / 2;
        if vertices < 3 {
            return Ok(());
        }

        out.reserve(vertices.saturating_sub(2) * 3);
        self.store.reset(vertices * 3 / 2);

        let outer_len = self.hole_starts.first().copied().unwrap_or(vertices);
        let Some(mut outer) = build_ring(&mut self.store, coords, 0, outer_len, true) else {
            return Ok(());
        };
        {
            let n = &self.store[outer];
            if n.next == n.prev {
                return Ok(());
            }
        }

        if !self.hole_starts.is_empty() {
            outer = merge_holes(
                &mut self.store,
                coords,
                &self.hole_starts,
                vertices,
                outer,
                &mut self.hole_queue,
            );
        }

        // large inputs get a Morton index over the outer ring's bbox
        let grid = if vertices > self.spatial_threshold {
            MortonGrid::from_outer_ring(coords, outer_len)
        } else {
            None
        };

        clip_ears(&mut self.store, outer, out, grid, Pass::Scan);
        Ok(())
    }

    /// Validate the buffers and stash hole offsets as plain `usize`.
    fn check_input<N: VertexIndex>(
        &mut self,
        coords: &[T],
        hole_starts: &[N],
    ) -> Result<(), InputError> {
        if coords.len() % 2 != 0 {
            return Err(InputError::UnpairedCoordinate {
                slots: coords.len(),
            });
        }
        for (slot, &v) in coords.iter().enumerate() {
            if !v.is_finite() {
                return Err(InputError::NonFiniteCoordinate { slot });
            }
        }

        let vertices = coords.len() / 2;
        self.hole_starts.clear();
        let mut previous = 0usize;
        for (hole, &start) in hole_starts.iter().enumerate() {
            let start = start.into_usize();
            if start < previous || start > vertices {
                return Err(InputError::HoleOutOfRange {
                    hole,
                    start,
                    vertices,
                });
            }
            previous = start;
            self.hole_starts.push(start);
        }
        Ok(())
    }
}

/// Relative difference between the polygon's area and the total area of the
/// produced triangles; a correctness probe, 0 for a perfect fill.
pub fn deviation<T: Float, N: VertexIndex>(coords: &[T], hole_starts: &[N], triangles: &[N]) -> T {
    let vertices = coords.len() / 2;
    let outer_len = if hole_starts.is_empty() {
        vertices
    } else {
        hole_starts[0].into_usize()
    };

    let polygon_area = if vertices < 3 {
        T::zero()
    } else {
        let mut area = geom::ring_area(coords, 0, outer_len).abs();
        for (i, hole) in hole_starts.iter().enumerate() {
            let start = hole.into_usize();
            let end = if i + 1 < hole_starts.len() {
                hole_starts[i + 1].into_usize()
            } else {
                vertices
            };
            if end - start >= 3 {
                area = area - geom::ring_area(coords, start, end).abs();
            }
        }
        area
    };

    let mut triangles_area = T::zero();
    for tri in triangles.chunks_exact(3) {
        let (a, b, c) = (
            tri[0].into_usize(),
            tri[1].into_usize(),
            tri[2].into_usize(),
        );
        triangles_area = triangles_area
            + ((coords[2 * a] - coords[2 * c]) * (coords[2 * b + 1] - coords[2 * a + 1])
                - (coords[2 * a] - coords[2 * b]) * (coords[2 * c + 1] - coords[2 * a + 1]))
                .abs();
    }

    if polygon_area == T::zero() && triangles_area == T::zero() {
        T::zero()
    } else {
        ((polygon_area - triangles_area) / polygon_area).abs()
    }
}

/// Flatten a ring-of-points polygon (outer ring first, then holes) into the
/// flat coordinate buffer and hole offsets [`Triangulator::triangulate`]
/// expects.
pub fn flatten<T: Float, N: VertexIndex>(rings: &[Vec<[T; 2]>]) -> (Vec<T>, Vec<N>) {
    let mut coords = Vec::new();
    let mut hole_starts = Vec::new();
    let mut offset = 0usize;
    for (k, ring) in rings.iter().enumerate() {
        if k > 0 {
            hole_starts.push(N::from_usize(offset));
        }
        for &[x, y] in ring {
            coords.push(x);
            coords.push(y);
        }
        offset += ring.len();
    }
    (coords, hole_starts)
}
