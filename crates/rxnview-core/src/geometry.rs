//! Logical-space geometry primitives.
//!
//! `Point` and `Bounds` are plain value types shared by every layer of the
//! engine. All functions here are pure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A 2D point or vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin `(0, 0)`.
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Calculates distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }

    /// Euclidean length when interpreted as a vector.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Componentwise minimum.
    pub fn min(&self, other: &Point) -> Point {
        Point::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Componentwise maximum.
    pub fn max(&self, other: &Point) -> Point {
        Point::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Clamps each component into `bounds`.
    pub fn clamp_to(&self, bounds: &Bounds) -> Point {
        Point::new(
            self.x.clamp(bounds.min_x, bounds.max_x),
            self.y.clamp(bounds.min_y, bounds.max_y),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Creates bounds from two corners, normalizing their order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Creates bounds from a top-left position and a size.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Creates bounds spanning two points.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    /// Creates a square of side `2 * radius` centered on `center`.
    pub fn around(center: Point, radius: f64) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Bottom-right corner.
    pub fn far_corner(&self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    pub fn size(&self) -> Point {
        Point::new(self.width(), self.height())
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Inclusive containment test.
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Overlap test; touching edges count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }

    /// Whether `other` lies entirely within these bounds.
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Overlapping region, or `None` when the bounds are disjoint.
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        if !self.intersects(other) {
            return None;
        }
        Some(Bounds {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grows (or shrinks, for negative values) every side by `margin`.
    pub fn expanded(&self, margin: f64) -> Bounds {
        Bounds::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    pub fn translated(&self, delta: Point) -> Bounds {
        Bounds {
            min_x: self.min_x + delta.x,
            min_y: self.min_y + delta.y,
            max_x: self.max_x + delta.x,
            max_y: self.max_y + delta.y,
        }
    }

    /// The same size, with the top-left corner moved to `origin`.
    pub fn with_origin(&self, origin: Point) -> Bounds {
        Bounds::from_origin_size(origin.x, origin.y, self.width(), self.height())
    }

    /// True when either side has (effectively) zero length.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= f64::EPSILON || self.height() <= f64::EPSILON
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    /// Translates these bounds by the smallest amount that places them inside
    /// `outer`. Returns `None` when they are larger than `outer` on either axis.
    pub fn fit_inside(&self, outer: &Bounds) -> Option<Bounds> {
        if self.width() > outer.width() + f64::EPSILON
            || self.height() > outer.height() + f64::EPSILON
        {
            return None;
        }
        let x = self.min_x.min(outer.max_x - self.width()).max(outer.min_x);
        let y = self.min_y.min(outer.max_y - self.height()).max(outer.min_y);
        Some(self.with_origin(Point::new(x, y)))
    }

    /// Union of all bounds in `iter`, or `None` when it is empty.
    pub fn enclosing<'a, I>(iter: I) -> Option<Bounds>
    where
        I: IntoIterator<Item = &'a Bounds>,
    {
        iter.into_iter()
            .fold(None, |acc: Option<Bounds>, b| match acc {
                Some(a) => Some(a.union(b)),
                None => Some(*b),
            })
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({:.2}, {:.2}) - ({:.2}, {:.2})]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Shortest distance from `p` to the segment `a`-`b`.
///
/// A zero-length segment degrades to the distance to `a`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq <= f64::EPSILON {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    let projection = a + ab * t;
    p.distance_to(&projection)
}

/// Samples a cubic Bezier curve into `segments + 1` points.
pub fn cubic_bezier(p0: Point, p1: Point, p2: Point, p3: Point, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let mt = 1.0 - t;
            let b0 = mt * mt * mt;
            let b1 = 3.0 * mt * mt * t;
            let b2 = 3.0 * mt * t * t;
            let b3 = t * t * t;
            Point::new(
                p0.x * b0 + p1.x * b1 + p2.x * b2 + p3.x * b3,
                p0.y * b0 + p1.y * b1 + p2.y * b2 + p3.y * b3,
            )
        })
        .collect()
}

/// Point where the ray from `from` through `toward` leaves `bounds`.
///
/// When the two points coincide there is no direction, and `from` is
/// returned unchanged.
pub fn ray_exit(bounds: &Bounds, from: Point, toward: Point) -> Point {
    let d = toward - from;
    if d.length() <= f64::EPSILON {
        return from;
    }

    let axis_exit = |start: f64, dir: f64, lo: f64, hi: f64| -> f64 {
        if dir > 0.0 {
            (hi - start) / dir
        } else if dir < 0.0 {
            (lo - start) / dir
        } else {
            f64::INFINITY
        }
    };

    let tx = axis_exit(from.x, d.x, bounds.min_x, bounds.max_x);
    let ty = axis_exit(from.y, d.y, bounds.min_y, bounds.max_y);
    let t = tx.min(ty).max(0.0);
    from + d * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_bounds_normalizes_corners() {
        let b = Bounds::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(b.min_x, 0.0);
        assert_eq!(b.max_y, 10.0);
        assert_eq!(b.width(), 10.0);
    }

    #[test]
    fn test_bounds_touching_intersects() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(10.0, 0.0, 20.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&Bounds::new(10.1, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_intersection() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, -5.0, 20.0, 8.0);
        assert_eq!(a.intersection(&b), Some(Bounds::new(5.0, 0.0, 10.0, 8.0)));
        assert_eq!(a.intersection(&Bounds::new(11.0, 0.0, 12.0, 1.0)), None);
    }

    #[test]
    fn test_fit_inside() {
        let outer = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let inner = Bounds::from_origin_size(90.0, -5.0, 20.0, 20.0);
        let fitted = inner.fit_inside(&outer).unwrap();
        assert_eq!(fitted, Bounds::from_origin_size(80.0, 0.0, 20.0, 20.0));

        let too_big = Bounds::from_origin_size(0.0, 0.0, 150.0, 10.0);
        assert!(too_big.fit_inside(&outer).is_none());
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(Point::new(5.0, 3.0), a, b) - 3.0).abs() < EPS);
        assert!((distance_to_segment(Point::new(-4.0, 3.0), a, b) - 5.0).abs() < EPS);
        assert!((distance_to_segment(Point::new(3.0, 4.0), a, a) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_cubic_bezier_endpoints() {
        let pts = cubic_bezier(
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            29,
        );
        assert_eq!(pts.len(), 30);
        assert_eq!(pts[0], Point::new(0.0, 0.0));
        assert!((pts[29].x - 10.0).abs() < EPS && pts[29].y.abs() < EPS);
    }

    #[test]
    fn test_ray_exit() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let exit = ray_exit(&b, Point::new(5.0, 5.0), Point::new(20.0, 5.0));
        assert!((exit.x - 10.0).abs() < EPS && (exit.y - 5.0).abs() < EPS);

        let diag = ray_exit(&b, Point::new(5.0, 5.0), Point::new(0.0, 0.0));
        assert!(diag.x.abs() < EPS && diag.y.abs() < EPS);

        let same = ray_exit(&b, Point::new(5.0, 5.0), Point::new(5.0, 5.0));
        assert_eq!(same, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_enclosing() {
        let items = [
            Bounds::new(0.0, 0.0, 1.0, 1.0),
            Bounds::new(5.0, -2.0, 6.0, 3.0),
        ];
        let all = Bounds::enclosing(items.iter()).unwrap();
        assert_eq!(all, Bounds::new(0.0, -2.0, 6.0, 3.0));
        assert!(Bounds::enclosing(std::iter::empty()).is_none());
    }
}
