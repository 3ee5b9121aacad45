use std::collections::HashMap;
use geo::{EuclideanDistance, Point};
use crate::models::NeighborIndexKind;

/// Neighborhood queries over a fixed point set.
///
/// Distances are planar Euclidean in (lng, lat) degree space. This is an
/// approximation that holds up at the regional scale used for clustering.
pub trait NeighborFinder {
    /// Indices of every *other* point within `epsilon` (inclusive) of the
    /// point at `index`, in ascending index order
    fn within(&self, index: usize, epsilon: f64) -> Vec<usize>;

    /// Number of indexed points
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the configured neighbor finder over `points`
pub fn build_neighbor_finder(
    kind: NeighborIndexKind,
    points: Vec<Point<f64>>,
    epsilon: f64,
) -> Box<dyn NeighborFinder> {
    match kind {
        NeighborIndexKind::Linear => Box::new(LinearScan::new(points)),
        NeighborIndexKind::Grid => Box::new(GridIndex::new(points, epsilon)),
    }
}

/// Pairwise scan, O(n) per query. Fine for per-user photo counts.
#[derive(Debug, Clone)]
pub struct LinearScan {
    points: Vec<Point<f64>>,
}

impl LinearScan {
    pub fn new(points: Vec<Point<f64>>) -> Self {
        Self { points }
    }
}

impl NeighborFinder for LinearScan {
    fn within(&self, index: usize, epsilon: f64) -> Vec<usize> {
        let Some(origin) = self.points.get(index) else {
            return Vec::new();
        };

        self.points
            .iter()
            .enumerate()
            .filter(|(idx, other)| *idx != index && origin.euclidean_distance(*other) <= epsilon)
            .map(|(idx, _)| idx)
            .collect()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// Uniform grid bucketing points into square cells.
///
/// A query only inspects the cells that can hold a point within `epsilon`,
/// so dense histories don't pay for a full scan per point.
#[derive(Debug, Clone)]
pub struct GridIndex {
    points: Vec<Point<f64>>,
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

/// Largest cell coordinate magnitude; beyond it `f64` quotients stop being
/// exact enough to tell adjacent cells apart
const MAX_CELL_COORD: f64 = (1u64 << 40) as f64;

impl GridIndex {
    /// Index `points` using cells of side `cell_size` degrees.
    ///
    /// A non-positive or non-finite size falls back to one degree. Cells are
    /// widened when needed to keep every cell coordinate within
    /// `MAX_CELL_COORD`.
    pub fn new(points: Vec<Point<f64>>, cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 { cell_size } else { 1.0 };

        let extent = points
            .iter()
            .flat_map(|p| [p.x().abs(), p.y().abs()])
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        let cell_size = cell_size.max(extent / MAX_CELL_COORD);

        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (idx, point) in points.iter().enumerate() {
            cells.entry(cell_of(point, cell_size)).or_default().push(idx);
        }

        Self { points, cell_size, cells }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }
}

#[inline]
fn cell_of(point: &Point<f64>, cell_size: f64) -> (i64, i64) {
    (
        (point.x() / cell_size).floor() as i64,
        (point.y() / cell_size).floor() as i64,
    )
}

impl NeighborFinder for GridIndex {
    fn within(&self, index: usize, epsilon: f64) -> Vec<usize> {
        let Some(origin) = self.points.get(index) else {
            return Vec::new();
        };
        let is_neighbor =
            |idx: usize| idx != index && origin.euclidean_distance(&self.points[idx]) <= epsilon;

        let reach = (epsilon / self.cell_size).ceil().max(1.0);
        let side = 2.0 * reach + 1.0;

        let mut found: Vec<usize> = if !reach.is_finite() || side * side >= self.cells.len() as f64 {
            // The window covers at least as many cells as are occupied
            self.cells
                .values()
                .flat_map(|bucket| bucket.iter().copied())
                .filter(|&idx| is_neighbor(idx))
                .collect()
        } else {
            let reach = reach as i64;
            let (cx, cy) = cell_of(origin, self.cell_size);

            let mut found = Vec::new();
            for dx in -reach..=reach {
                for dy in -reach..=reach {
                    let (Some(x), Some(y)) = (cx.checked_add(dx), cy.checked_add(dy)) else {
                        continue;
                    };
                    if let Some(bucket) = self.cells.get(&(x, y)) {
                        found.extend(bucket.iter().copied().filter(|&idx| is_neighbor(idx)));
                    }
                }
            }
            found
        };

        found.sort_unstable();
        found
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<Point<f64>> {
        vec![
            Point::new(-122.70, 49.19),
            Point::new(-122.69, 49.20),
            Point::new(139.69, 35.68),
            Point::new(-122.71, 49.18),
            Point::new(-123.50, 49.19),
        ]
    }

    #[test]
    fn test_linear_scan_excludes_self() {
        let finder = LinearScan::new(points());
        assert_eq!(finder.within(0, 0.1), vec![1, 3]);
        assert!(finder.within(2, 0.1).is_empty());
    }

    #[test]
    fn test_epsilon_is_inclusive() {
        let finder = LinearScan::new(vec![Point::new(0.0, 0.0), Point::new(0.5, 0.0)]);
        assert_eq!(finder.within(0, 0.5), vec![1]);
        assert!(finder.within(0, 0.49).is_empty());
    }

    #[test]
    fn test_out_of_bounds_index() {
        let finder = LinearScan::new(points());
        assert!(finder.within(99, 1.0).is_empty());
        let grid = GridIndex::new(points(), 1.0);
        assert!(grid.within(99, 1.0).is_empty());
    }

    #[test]
    fn test_grid_matches_linear_scan() {
        let pts = points();
        for epsilon in [0.01, 0.1, 0.5, 1.0, 50.0, 300.0] {
            let linear = LinearScan::new(pts.clone());
            let grid = GridIndex::new(pts.clone(), epsilon);
            for idx in 0..pts.len() {
                assert_eq!(
                    linear.within(idx, epsilon),
                    grid.within(idx, epsilon),
                    "mismatch at index {} for epsilon {}",
                    idx,
                    epsilon
                );
            }
        }
    }

    #[test]
    fn test_grid_with_query_radius_larger_than_cells() {
        let pts = points();
        let linear = LinearScan::new(pts.clone());
        let grid = GridIndex::new(pts, 0.05);
        assert_eq!(linear.within(0, 1.0), grid.within(0, 1.0));
    }

    #[test]
    fn test_grid_window_matches_linear_on_lattice() {
        let pts: Vec<Point<f64>> = (0..20)
            .flat_map(|i| (0..20).map(move |j| Point::new(i as f64 * 0.3 - 3.0, j as f64 * 0.3 + 40.0)))
            .collect();
        let linear = LinearScan::new(pts.clone());
        let grid = GridIndex::new(pts.clone(), 0.5);
        for idx in 0..pts.len() {
            assert_eq!(linear.within(idx, 0.5), grid.within(idx, 0.5));
        }
    }

    #[test]
    fn test_grid_with_tiny_epsilon() {
        let grid = GridIndex::new(vec![Point::new(100.0, 0.0); 2], 1e-17);
        assert_eq!(grid.within(0, 1e-17), vec![1]);
        assert!(grid.cell_size() > 1e-17);

        let pts = vec![
            Point::new(180.0, 90.0),
            Point::new(180.0, 90.0),
            Point::new(-180.0, -90.0),
            Point::new(179.0, 89.0),
        ];
        let linear = LinearScan::new(pts.clone());
        let grid = GridIndex::new(pts.clone(), 1e-300);
        for idx in 0..pts.len() {
            assert_eq!(linear.within(idx, 1e-300), grid.within(idx, 1e-300));
        }
    }

    #[test]
    fn test_build_neighbor_finder() {
        let finder = build_neighbor_finder(NeighborIndexKind::Grid, points(), 0.1);
        assert_eq!(finder.len(), 5);
        assert_eq!(finder.within(0, 0.1), vec![1, 3]);
    }
}
