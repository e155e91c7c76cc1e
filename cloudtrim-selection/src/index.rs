//! R-tree over projected points
//!
//! Bulk-loading the screen positions once lets each box query descend only into
//! the subtrees whose envelopes overlap it instead of scanning the whole cloud.
//! Envelope containment is inclusive on both ends, so results are identical to
//! the linear scan.

use rstar::primitives::GeomWithData;
use rstar::{Envelope, RTree, SelectionFunction, AABB};
use tracing::trace;

use crate::projection::{Projection, ScreenPoint};
use crate::selection::{ScreenRect, SelectionBox, SelectionResult};

type IndexedScreenPoint = GeomWithData<[f32; 2], usize>;

/// Inclusive rectangle test used to walk the tree
struct InRect(AABB<[f32; 2]>);

impl SelectionFunction<IndexedScreenPoint> for InRect {
    fn should_unpack_parent(&self, envelope: &AABB<[f32; 2]>) -> bool {
        self.0.intersects(envelope)
    }

    fn should_unpack_leaf(&self, leaf: &IndexedScreenPoint) -> bool {
        self.0.contains_point(leaf.geom())
    }
}

/// Spatial index from screen position to point index
#[derive(Debug, Clone)]
pub struct ScreenIndex {
    tree: RTree<IndexedScreenPoint>,
}

impl ScreenIndex {
    /// Index every finite projected point; unprojected (NaN) points are left out
    pub fn build(screen_points: &[ScreenPoint]) -> Self {
        let entries: Vec<IndexedScreenPoint> = screen_points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.x.is_finite() && p.y.is_finite())
            .map(|(idx, p)| GeomWithData::new([p.x, p.y], idx))
            .collect();
        let tree = RTree::bulk_load(entries);
        trace!(points = tree.size(), "built screen index");
        Self { tree }
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Indices inside `rect`, ascending
    pub fn query(&self, rect: &ScreenRect) -> Vec<usize> {
        let mut hits = Vec::new();
        self.collect(rect, &mut hits);
        hits.sort_unstable();
        hits
    }

    /// Union over `boxes`, equal to [`crate::select_union`] on the same projection
    pub fn select_union(&self, projection: &Projection, boxes: &[SelectionBox]) -> SelectionResult {
        let mut hits = Vec::new();
        for selection_box in boxes {
            self.collect(&selection_box.rect(), &mut hits);
        }
        SelectionResult::new(projection.version(), hits)
    }

    fn collect(&self, rect: &ScreenRect, hits: &mut Vec<usize>) {
        // NaN bounds
        if !(rect.min_x <= rect.max_x && rect.min_y <= rect.max_y) {
            return;
        }
        let envelope = AABB::from_corners([rect.min_x, rect.min_y], [rect.max_x, rect.max_y]);
        hits.extend(
            self.tree
                .locate_with_selection_function(InRect(envelope))
                .map(|entry| entry.data),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{select_in_box, select_union_indices, BoxId};
    use cloudtrim_core::PointBuffer;
    use nalgebra::Point2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, seed: u64) -> Vec<ScreenPoint> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| ScreenPoint::new(rng.gen_range(-50.0..850.0), rng.gen_range(-50.0..650.0)))
            .collect()
    }

    #[test]
    fn test_query_matches_linear_scan() {
        let points = random_points(2_000, 7);
        let index = ScreenIndex::build(&points);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..50 {
            let a = Point2::new(rng.gen_range(0.0..800.0), rng.gen_range(0.0..600.0));
            let b = Point2::new(rng.gen_range(0.0..800.0), rng.gen_range(0.0..600.0));
            let rect = ScreenRect::from_corners(a, b);
            assert_eq!(index.query(&rect), select_in_box(&points, rect));
        }
    }

    #[test]
    fn test_boundary_point_is_included() {
        let points = vec![ScreenPoint::new(64.0, 64.0), ScreenPoint::new(63.9, 10.0)];
        let index = ScreenIndex::build(&points);
        let rect = ScreenRect { min_x: 0.0, max_x: 64.0, min_y: 0.0, max_y: 64.0 };
        assert_eq!(index.query(&rect), vec![0, 1]);
    }

    #[test]
    fn test_huge_and_infinite_rects() {
        let points = vec![ScreenPoint::new(1.0, 1.0), ScreenPoint::new(700.0, 500.0)];
        let index = ScreenIndex::build(&points);

        let huge = ScreenRect { min_x: -1e10, max_x: 1e10, min_y: -1e10, max_y: 1e10 };
        assert_eq!(index.query(&huge), vec![0, 1]);
        assert_eq!(index.query(&huge), select_in_box(&points, huge));

        let infinite = ScreenRect {
            min_x: f32::NEG_INFINITY,
            max_x: f32::INFINITY,
            min_y: f32::NEG_INFINITY,
            max_y: f32::INFINITY,
        };
        assert_eq!(index.query(&infinite), select_in_box(&points, infinite));

        let half_open = ScreenRect {
            min_x: 500.0,
            max_x: f32::INFINITY,
            min_y: -1e10,
            max_y: 1e10,
        };
        assert_eq!(index.query(&half_open), vec![1]);
    }

    #[test]
    fn test_unprojected_points_are_skipped() {
        let points = vec![ScreenPoint::new(f32::NAN, f32::NAN), ScreenPoint::new(1.0, 1.0)];
        let index = ScreenIndex::build(&points);
        assert_eq!(index.len(), 1);

        let nan_rect = ScreenRect { min_x: f32::NAN, max_x: 5.0, min_y: 0.0, max_y: 5.0 };
        assert!(index.query(&nan_rect).is_empty());
    }

    #[test]
    fn test_union_matches_linear_union() {
        let buffer = PointBuffer::load(vec![nalgebra::Point3::origin(); 500]);
        let points = random_points(500, 5);
        let boxes = vec![
            SelectionBox::new(BoxId(1), Point2::new(100.0, 100.0), Point2::new(300.0, 250.0)),
            SelectionBox::new(BoxId(2), Point2::new(280.0, 240.0), Point2::new(500.0, 400.0)),
            SelectionBox::new(BoxId(3), Point2::new(700.0, 10.0), Point2::new(650.0, 80.0)),
        ];
        let projection = Projection::from_points(buffer.version(), points.clone());
        let selection = ScreenIndex::build(&projection).select_union(&projection, &boxes);
        assert_eq!(
            selection.indices_for(&buffer),
            select_union_indices(&points, &boxes).as_slice()
        );
    }
}
