//! Spatial segment assignment and hit-testing
//!
//! This module maps video ids onto a fixed (segment, subsection) grid laid
//! over the globe's (u, v) parameterization. The assignment is a randomized
//! permutation built once per session and immutable afterwards, so pointer
//! hit-testing and any draw data keyed by cell index stay stable.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::VideoId;

/// Default number of vertical segments
pub const DEFAULT_SEGMENTS: usize = 6;

/// Default number of subsections per segment
pub const DEFAULT_SUBSECTIONS: usize = 5;

/// Default unmapped margin at each pole, as a fraction of the v range
pub const DEFAULT_POLAR_MARGIN: f32 = 0.1;

/// Fixed grid dimensions over the surface's (u, v) space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    /// Number of vertical segments (bands)
    pub segments: usize,
    /// Number of horizontal subsections per segment
    pub subsections: usize,
    /// Unmapped margin at each pole; v values inside a margin hit nothing
    pub polar_margin: f32,
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENTS,
            subsections: DEFAULT_SUBSECTIONS,
            polar_margin: DEFAULT_POLAR_MARGIN,
        }
    }
}

impl SurfaceLayout {
    /// Total number of addressable cells
    pub fn total_cells(&self) -> usize {
        self.segments * self.subsections
    }

    /// Height of one segment band in v units
    pub fn band_height(&self) -> f32 {
        (1.0 - 2.0 * self.polar_margin) / self.segments as f32
    }
}

/// Address of one (segment, subsection) cell
///
/// Segment ids are 1-based; subsections are 0-based within their segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub segment_id: u32,
    pub subsection: usize,
}

/// Result of hit-testing a surface coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellHit {
    /// The cell the coordinate falls in
    pub address: CellAddress,
    /// The video placed in that cell, or `None` for an empty slot
    pub video: Option<VideoId>,
}

/// One vertical band of the surface with its subsection slots
#[derive(Debug, Clone)]
pub struct Segment {
    id: u32,
    min_v: f32,
    max_v: f32,
    cells: Vec<Option<VideoId>>,
}

impl Segment {
    /// 1-based segment id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The `[min_v, max_v)` band this segment covers
    pub fn band(&self) -> (f32, f32) {
        (self.min_v, self.max_v)
    }

    /// The subsection slots of this segment, in horizontal order
    pub fn cells(&self) -> &[Option<VideoId>] {
        &self.cells
    }

    fn contains_v(&self, v: f32) -> bool {
        v >= self.min_v && v < self.max_v
    }
}

/// Immutable randomized assignment of video ids to surface cells
///
/// Built exactly once per session. Re-running [`resolve`](Self::resolve)
/// with the same coordinate always yields the same result.
#[derive(Debug, Clone)]
pub struct SegmentMap {
    layout: SurfaceLayout,
    segments: Vec<Segment>,
}

impl SegmentMap {
    /// Builds the assignment by shuffling cell positions with `rng`
    ///
    /// The first `min(ids.len(), total_cells)` shuffled positions receive
    /// the ids in order; remaining cells stay empty, remaining ids stay
    /// unplaced.
    pub fn build<R: Rng>(ids: &[VideoId], layout: SurfaceLayout, rng: &mut R) -> Self {
        let total = layout.total_cells();
        let mut positions: Vec<usize> = (0..total).collect();
        positions.shuffle(rng);

        let mut cells: Vec<Option<VideoId>> = vec![None; total];
        for (index, id) in ids.iter().take(total).enumerate() {
            cells[positions[index]] = Some(id.clone());
        }

        let band = layout.band_height();
        let segments = (0..layout.segments)
            .map(|segment_index| {
                let min_v = layout.polar_margin + segment_index as f32 * band;
                let start = segment_index * layout.subsections;
                Segment {
                    id: segment_index as u32 + 1,
                    min_v,
                    max_v: min_v + band,
                    cells: cells[start..start + layout.subsections].to_vec(),
                }
            })
            .collect();

        Self { layout, segments }
    }

    /// Builds the assignment from a fixed seed, for reproducible placement
    pub fn with_seed(ids: &[VideoId], layout: SurfaceLayout, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::build(ids, layout, &mut rng)
    }

    /// The grid dimensions this map was built with
    pub fn layout(&self) -> &SurfaceLayout {
        &self.layout
    }

    /// The segments in vertical order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolves a surface coordinate to its cell, or `None` in the margins
    ///
    /// `uv` is the surface-local coordinate in `[0,1)×[0,1)`. The
    /// subsection index is clamped to tolerate boundary floating error.
    pub fn resolve(&self, uv: Vec2) -> Option<CellHit> {
        let segment = self.segments.iter().find(|s| s.contains_v(uv.y))?;
        let max_index = self.layout.subsections as isize - 1;
        let subsection =
            ((uv.x * self.layout.subsections as f32).floor() as isize).clamp(0, max_index) as usize;

        Some(CellHit {
            address: CellAddress {
                segment_id: segment.id,
                subsection,
            },
            video: segment.cells[subsection].clone(),
        })
    }

    /// The video placed at the given cell, or `None` for empty/out of range
    pub fn video_at(&self, address: CellAddress) -> Option<&VideoId> {
        let segment = self
            .segments
            .iter()
            .find(|segment| segment.id == address.segment_id)?;
        segment.cells.get(address.subsection)?.as_ref()
    }

    /// Iterates every cell in stable (segment, subsection) order
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, Option<&VideoId>)> + '_ {
        self.segments.iter().flat_map(|segment| {
            segment.cells.iter().enumerate().map(move |(index, slot)| {
                (
                    CellAddress {
                        segment_id: segment.id,
                        subsection: index,
                    },
                    slot.as_ref(),
                )
            })
        })
    }

    /// Iterates the ids that received a cell, in stable cell order
    pub fn placed_ids(&self) -> impl Iterator<Item = &VideoId> + '_ {
        self.cells().filter_map(|(_, slot)| slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<VideoId> {
        names.iter().map(|name| VideoId::new(*name)).collect()
    }

    #[test]
    fn test_every_id_placed_exactly_once() {
        let videos = ids(&["v1", "v2", "v3", "v4", "v5", "v6", "v7"]);
        let map = SegmentMap::with_seed(&videos, SurfaceLayout::default(), 42);

        let mut placed: Vec<_> = map.placed_ids().cloned().collect();
        placed.sort();
        let mut expected = videos.clone();
        expected.sort();
        assert_eq!(placed, expected);
    }

    #[test]
    fn test_surplus_ids_stay_unplaced() {
        let layout = SurfaceLayout {
            segments: 2,
            subsections: 2,
            polar_margin: 0.1,
        };
        let videos = ids(&["a", "b", "c", "d", "e", "f"]);
        let map = SegmentMap::with_seed(&videos, layout, 7);

        assert_eq!(map.placed_ids().count(), 4);
    }

    #[test]
    fn test_polar_margins_hit_nothing() {
        let videos = ids(&["v1"]);
        let map = SegmentMap::with_seed(&videos, SurfaceLayout::default(), 1);

        assert!(map.resolve(Vec2::new(0.5, 0.0)).is_none());
        assert!(map.resolve(Vec2::new(0.5, 0.05)).is_none());
        assert!(map.resolve(Vec2::new(0.5, 0.95)).is_none());
        assert!(map.resolve(Vec2::new(0.5, 0.999)).is_none());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let videos = ids(&["v1", "v2", "v3"]);
        let map = SegmentMap::with_seed(&videos, SurfaceLayout::default(), 99);
        let uv = Vec2::new(0.37, 0.42);

        let first = map.resolve(uv);
        for _ in 0..10 {
            assert_eq!(map.resolve(uv), first);
        }
    }

    #[test]
    fn test_same_seed_same_placement() {
        let videos = ids(&["v1", "v2", "v3", "v4"]);
        let layout = SurfaceLayout::default();
        let first = SegmentMap::with_seed(&videos, layout, 5);
        let second = SegmentMap::with_seed(&videos, layout, 5);

        let a: Vec<_> = first.cells().map(|(_, slot)| slot.cloned()).collect();
        let b: Vec<_> = second.cells().map(|(_, slot)| slot.cloned()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_subsection_clamped_at_right_edge() {
        let videos = ids(&["v1", "v2"]);
        let map = SegmentMap::with_seed(&videos, SurfaceLayout::default(), 3);

        // u = 1.0 is out of the half-open range but must clamp, not panic
        let hit = map.resolve(Vec2::new(1.0, 0.5)).unwrap();
        assert_eq!(hit.address.subsection, DEFAULT_SUBSECTIONS - 1);
    }

    #[test]
    fn test_bands_are_contiguous_and_ordered() {
        let map = SegmentMap::with_seed(&ids(&["v1"]), SurfaceLayout::default(), 0);
        let segments = map.segments();

        for pair in segments.windows(2) {
            let (_, prev_max) = pair[0].band();
            let (next_min, _) = pair[1].band();
            assert!((prev_max - next_min).abs() < 1e-6);
        }
        let (first_min, _) = segments[0].band();
        assert!((first_min - DEFAULT_POLAR_MARGIN).abs() < 1e-6);
    }

    #[test]
    fn test_video_at_matches_resolve() {
        let videos = ids(&["v1", "v2", "v3"]);
        let map = SegmentMap::with_seed(&videos, SurfaceLayout::default(), 11);

        for (address, slot) in map.cells() {
            assert_eq!(map.video_at(address), slot);
        }
    }
}
