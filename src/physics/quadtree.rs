use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Axis-aligned square covering part of the layout plane.
#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().fold(
            (
                vec2(f32::INFINITY, f32::INFINITY),
                vec2(f32::NEG_INFINITY, f32::NEG_INFINITY),
            ),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    pub(super) fn side(self) -> f32 {
        self.half_extent * 2.0
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign_x = if quadrant & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if quadrant & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half_extent: quarter,
        }
    }
}

/// Barnes-Hut cell: either a leaf holding point indices or an internal cell
/// with up to four children. `mass` is the number of points underneath.
pub(super) struct Cell {
    pub(super) bounds: Square,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) points: Vec<usize>,
    pub(super) children: [Option<Box<Cell>>; 4],
}

impl Cell {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = Square::enclosing(positions)?;
        Some(Self::subdivide(
            bounds,
            (0..positions.len()).collect(),
            positions,
            0,
        ))
    }

    fn subdivide(bounds: Square, points: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = points.len() as f32;
        let center_of_mass = if points.is_empty() {
            bounds.center
        } else {
            points
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / mass
        };

        let mut cell = Self {
            bounds,
            center_of_mass,
            mass,
            points,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || cell.points.len() <= LEAF_CAPACITY {
            return cell;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &cell.points {
            buckets[bounds.quadrant_of(positions[index])].push(index);
        }

        // Coincident points would otherwise recurse until MAX_DEPTH for nothing.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return cell;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                cell.children[quadrant] = Some(Box::new(Self::subdivide(
                    bounds.quadrant(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        cell.points.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &Cell> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_points(cell: &Cell) -> usize {
        if cell.is_leaf() {
            cell.points.len()
        } else {
            cell.children().map(count_points).sum()
        }
    }

    #[test]
    fn every_point_lands_in_exactly_one_leaf() {
        let positions = (0..100)
            .map(|i| vec2((i % 10) as f32 * 37.0, (i / 10) as f32 * -21.0))
            .collect::<Vec<_>>();

        let root = Cell::build(&positions).unwrap();
        assert!(!root.is_leaf());
        assert_eq!(root.mass, 100.0);
        assert_eq!(count_points(&root), 100);
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 30];
        let root = Cell::build(&positions).unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.points.len(), 30);
        assert_eq!(root.center_of_mass, vec2(5.0, 5.0));
    }

    #[test]
    fn empty_input_has_no_tree() {
        assert!(Cell::build(&[]).is_none());
    }

    #[test]
    fn bounds_contain_all_points() {
        let positions = vec![vec2(-300.0, 10.0), vec2(250.0, -90.0), vec2(0.0, 400.0)];
        let root = Cell::build(&positions).unwrap();
        assert!(positions.iter().all(|point| root.bounds.contains(*point)));
    }
}
