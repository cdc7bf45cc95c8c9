//! Integer board geometry.
//!
//! All coordinates are nanometres, the internal unit of a KiCad board.

use serde::{Deserialize, Serialize};

/// Nanometres per millimetre.
pub const NM_PER_MM: i64 = 1_000_000;

/// Convert millimetres to internal units.
pub const fn mm(value: i64) -> i64 {
    value * NM_PER_MM
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    fn distance_sq(self, other: Point) -> i128 {
        let dx = (self.x - other.x) as i128;
        let dy = (self.y - other.y) as i128;
        dx * dx + dy * dy
    }
}

/// Width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i64,
    pub height: i64,
}

impl Size {
    pub const fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_center(center: Point, size: Size) -> Self {
        let hw = size.width / 2;
        let hh = size.height / 2;
        Self {
            min: center.offset(-hw, -hh),
            max: center.offset(hw, hh),
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Rect {
            min: first,
            max: first,
        };
        for p in iter {
            rect.include(p);
        }
        Some(rect)
    }

    pub fn include(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn merge(&mut self, other: &Rect) {
        self.include(other.min);
        self.include(other.max);
    }

    pub fn width(&self) -> i64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.min.x + self.width() / 2,
            self.min.y + self.height() / 2,
        )
    }

    /// Largest Y coordinate; the board's Y axis points down.
    pub fn bottom(&self) -> i64 {
        self.max.y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Even-odd point-in-polygon test. Points on the outline count as inside.
pub fn polygon_contains(outline: &[Point], p: Point) -> bool {
    if outline.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = outline.len() - 1;
    for i in 0..outline.len() {
        let a = outline[i];
        let b = outline[j];

        if segment_distance_sq(a, b, p) == 0 {
            return true;
        }

        if (a.y > p.y) != (b.y > p.y) {
            // x coordinate of the edge at p.y, compared without division
            let lhs = (p.x - a.x) as i128 * (b.y - a.y) as i128;
            let rhs = (b.x - a.x) as i128 * (p.y - a.y) as i128;
            let crosses = if b.y > a.y { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Squared distance from `p` to the segment `a`-`b`, rounded down.
pub fn segment_distance_sq(a: Point, b: Point, p: Point) -> i128 {
    let abx = (b.x - a.x) as i128;
    let aby = (b.y - a.y) as i128;
    let apx = (p.x - a.x) as i128;
    let apy = (p.y - a.y) as i128;

    let len_sq = abx * abx + aby * aby;
    if len_sq == 0 {
        return a.distance_sq(p);
    }

    let t = apx * abx + apy * aby;
    if t <= 0 {
        return a.distance_sq(p);
    }
    if t >= len_sq {
        return b.distance_sq(p);
    }

    // |ap x ab|^2 / |ab|^2
    let cross = apx * aby - apy * abx;
    cross * cross / len_sq
}

/// True when `p` lies within `radius` of the segment `a`-`b`.
pub fn segment_hits(a: Point, b: Point, radius: i64, p: Point) -> bool {
    let r = radius as i128;
    segment_distance_sq(a, b, p) <= r * r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ]
    }

    #[test]
    fn polygon_contains_interior_and_edges() {
        let sq = square();
        assert!(polygon_contains(&sq, Point::new(5, 5)));
        assert!(polygon_contains(&sq, Point::new(0, 5)));
        assert!(polygon_contains(&sq, Point::new(10, 10)));
        assert!(!polygon_contains(&sq, Point::new(11, 5)));
        assert!(!polygon_contains(&sq, Point::new(-1, -1)));
    }

    #[test]
    fn concave_polygon() {
        // U shape: the notch between x=3..7 above y=3 is outside
        let u = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(7, 10),
            Point::new(7, 3),
            Point::new(3, 3),
            Point::new(3, 10),
            Point::new(0, 10),
        ];
        assert!(polygon_contains(&u, Point::new(1, 8)));
        assert!(polygon_contains(&u, Point::new(9, 8)));
        assert!(!polygon_contains(&u, Point::new(5, 8)));
    }

    #[test]
    fn segment_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(10, 0);
        assert_eq!(segment_distance_sq(a, b, Point::new(5, 3)), 9);
        assert_eq!(segment_distance_sq(a, b, Point::new(-3, 4)), 25);
        assert!(segment_hits(a, b, 2, Point::new(12, 0)));
        assert!(!segment_hits(a, b, 1, Point::new(12, 0)));
    }

    #[test]
    fn rect_center_and_bottom() {
        let r = Rect::enclosing([Point::new(0, 0), Point::new(mm(20), mm(10))]).unwrap();
        assert_eq!(r.center(), Point::new(mm(10), mm(5)));
        assert_eq!(r.bottom(), mm(10));
        assert!(Rect::enclosing(Vec::new()).is_none());
    }
}
