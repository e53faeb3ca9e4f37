//! Grid Geometry
//!
//! Integer points and axis-aligned segments in board grid units
//! (1 unit = 0.01 inch). Everything the host hands back is truncated to
//! integers, so equality and ordering here are exact.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default tolerance, in grid units, for point-on-segment checks.
pub const DEFAULT_TOLERANCE: i32 = 1;

/// A point on the sheet grid.
///
/// Ordering is lexicographic (X first, then Y), which is what
/// [`canonical_key`] relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncate fractional coordinates toward zero.
    pub fn truncated(x: f64, y: f64) -> Self {
        Self {
            x: x.trunc() as i32,
            y: y.trunc() as i32,
        }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = (i64::from(self.x) - i64::from(other.x)) as f64;
        let dy = (i64::from(self.y) - i64::from(other.y)) as f64;
        dx.hypot(dy)
    }

    /// Midpoint with integer truncation toward zero.
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new(mid(self.x, other.x), mid(self.y, other.y))
    }
}

/// Integer midpoint of two coordinates, truncated toward zero. Computed
/// in i64 so imported extremes cannot overflow.
pub fn mid(a: i32, b: i32) -> i32 {
    ((i64::from(a) + i64::from(b)) / 2) as i32
}

/// `|a - b|` without i32 overflow
fn gap(a: i32, b: i32) -> i64 {
    (i64::from(a) - i64::from(b)).abs()
}

/// `v` within `[lo - tolerance, hi + tolerance]`, in i64
fn within(v: i32, lo: i32, hi: i32, tolerance: i32) -> bool {
    let (v, tol) = (i64::from(v), i64::from(tolerance));
    i64::from(lo) - tol <= v && v <= i64::from(hi) + tol
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

/// Order-independent identity of a wire span.
///
/// Two segments created independently (different sessions, different
/// endpoint order) are the same wire iff their keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentKey {
    pub min: Point,
    pub max: Point,
}

/// Canonical key of the span between `a` and `b`.
pub fn canonical_key(a: Point, b: Point) -> SegmentKey {
    if a <= b {
        SegmentKey { min: a, max: b }
    } else {
        SegmentKey { min: b, max: a }
    }
}

/// Orientation of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
    /// Both endpoints coincide.
    Degenerate,
    /// Neither coordinate is shared; never produced by the router.
    Diagonal,
}

/// Endpoints of one straight wire span, in the order the host reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub low: Point,
    pub high: Point,
}

impl Span {
    pub const fn new(low: Point, high: Point) -> Self {
        Self { low, high }
    }

    pub fn key(&self) -> SegmentKey {
        canonical_key(self.low, self.high)
    }

    pub fn axis(&self) -> Axis {
        match (self.low.x == self.high.x, self.low.y == self.high.y) {
            (true, true) => Axis::Degenerate,
            (true, false) => Axis::Vertical,
            (false, true) => Axis::Horizontal,
            (false, false) => Axis::Diagonal,
        }
    }

    pub fn is_axis_aligned(&self) -> bool {
        !matches!(self.axis(), Axis::Diagonal)
    }

    pub fn midpoint(&self) -> Point {
        self.low.midpoint(&self.high)
    }

    pub fn length(&self) -> f64 {
        self.low.distance_to(&self.high)
    }

    pub fn contains(&self, p: Point, tolerance: i32) -> bool {
        point_on_segment(p, self, tolerance)
    }

    pub fn distance_to(&self, p: Point) -> f64 {
        distance_point_to_segment(p, self)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.low, self.high)
    }
}

/// True when `p` lies on the span, with `tolerance` applied both across
/// the span and past each end.
///
/// Diagonal spans (which only ever come from foreign data) fall back to
/// the distance test.
pub fn point_on_segment(p: Point, span: &Span, tolerance: i32) -> bool {
    let (a, b) = (span.low, span.high);
    if a.x == b.x {
        return gap(p.x, a.x) <= i64::from(tolerance) && within(p.y, a.y.min(b.y), a.y.max(b.y), tolerance);
    }
    if a.y == b.y {
        return gap(p.y, a.y) <= i64::from(tolerance) && within(p.x, a.x.min(b.x), a.x.max(b.x), tolerance);
    }
    distance_point_to_segment(p, span) <= f64::from(tolerance)
}

/// Perpendicular distance when `p` projects onto the span, otherwise the
/// distance to the nearer endpoint.
///
/// Only used to rank candidates, never as an accept/reject threshold.
pub fn distance_point_to_segment(p: Point, span: &Span) -> f64 {
    let (a, b) = (span.low, span.high);
    if a.x == b.x && a.y.min(b.y) <= p.y && p.y <= a.y.max(b.y) {
        return gap(p.x, a.x) as f64;
    }
    if a.y == b.y && a.x.min(b.x) <= p.x && p.x <= a.x.max(b.x) {
        return gap(p.y, a.y) as f64;
    }
    p.distance_to(&a).min(p.distance_to(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key_is_order_independent() {
        let pairs = [
            (Point::new(0, 0), Point::new(0, 10)),
            (Point::new(5, -3), Point::new(-5, 3)),
            (Point::new(7, 7), Point::new(7, 7)),
            (Point::new(100, 20), Point::new(30, 20)),
        ];
        for (a, b) in pairs {
            assert_eq!(canonical_key(a, b), canonical_key(b, a));
        }
    }

    #[test]
    fn test_canonical_key_orders_lexicographically() {
        let key = canonical_key(Point::new(10, 0), Point::new(0, 50));
        assert_eq!(key.min, Point::new(0, 50));
        assert_eq!(key.max, Point::new(10, 0));
    }

    #[test]
    fn test_point_on_vertical_segment() {
        let span = Span::new(Point::new(100, 220), Point::new(100, 260));
        assert!(point_on_segment(Point::new(100, 240), &span, 1));
        assert!(point_on_segment(Point::new(101, 261), &span, 1));
        assert!(!point_on_segment(Point::new(102, 240), &span, 1));
        assert!(!point_on_segment(Point::new(100, 262), &span, 1));
    }

    #[test]
    fn test_point_on_horizontal_segment_any_endpoint_order() {
        let span = Span::new(Point::new(50, 10), Point::new(0, 10));
        assert!(point_on_segment(Point::new(25, 10), &span, 0));
        assert!(point_on_segment(Point::new(-1, 9), &span, 1));
        assert!(!point_on_segment(Point::new(25, 12), &span, 1));
    }

    #[test]
    fn test_distance_projects_onto_span() {
        let span = Span::new(Point::new(0, 0), Point::new(0, 100));
        assert_eq!(distance_point_to_segment(Point::new(30, 50), &span), 30.0);
        assert_eq!(distance_point_to_segment(Point::new(-7, 0), &span), 7.0);
    }

    #[test]
    fn test_distance_beyond_span_uses_nearer_endpoint() {
        let span = Span::new(Point::new(0, 0), Point::new(40, 0));
        assert_eq!(distance_point_to_segment(Point::new(43, 4), &span), 5.0);
        assert_eq!(distance_point_to_segment(Point::new(-3, -4), &span), 5.0);
    }

    #[test]
    fn test_midpoint_truncates_toward_zero() {
        let span = Span::new(Point::new(0, -30), Point::new(0, 5));
        assert_eq!(span.midpoint(), Point::new(0, -12));
        assert_eq!(Point::new(1, 1).midpoint(&Point::new(2, 2)), Point::new(1, 1));
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let span = Span::new(Point::new(100, 0), Point::new(100, 50));
        let far = Point::new(i32::MIN, 25);
        assert!(!point_on_segment(far, &span, 1));
        assert!(point_on_segment(Point::new(100, i32::MAX), &span, i32::MAX));
        let expected = 100.0 - f64::from(i32::MIN);
        assert_eq!(distance_point_to_segment(far, &span), expected);
        assert_eq!(mid(i32::MAX, i32::MAX), i32::MAX);
        assert_eq!(Point::new(i32::MIN, 0).midpoint(&Point::new(i32::MIN, 0)), Point::new(i32::MIN, 0));
    }

    #[test]
    fn test_axis_classification() {
        assert_eq!(Span::new(Point::new(0, 0), Point::new(0, 5)).axis(), Axis::Vertical);
        assert_eq!(Span::new(Point::new(0, 5), Point::new(9, 5)).axis(), Axis::Horizontal);
        assert_eq!(Span::new(Point::new(1, 1), Point::new(1, 1)).axis(), Axis::Degenerate);
        assert_eq!(Span::new(Point::new(0, 0), Point::new(3, 4)).axis(), Axis::Diagonal);
    }
}
