use std::{
    cmp::Ordering,
    ops::{Add, Sub},
};

/// Number of fixed-point units per input unit.
pub const FIXED_POINT_SCALE: i32 = 256;

/// Largest magnitude a quantized coordinate may have.
///
/// Within this range every kernel product fits the integer types used
/// below, so all comparisons and intersections are exact.
pub const MAX_COORDINATE: i32 = (1 << 23) - 1;

/// A 2D point in fixed-point coordinates (input units scaled by
/// [`FIXED_POINT_SCALE`]).
///
/// Points are ordered lexicographically by `y` and then by `x`, which
/// is the order in which the sweep visits them (top to bottom, left to
/// right).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    /// Quantize a floating point coordinate pair, rounding halves up
    /// (towards positive infinity). Returns `None` if the result is not
    /// representable within [`MAX_COORDINATE`].
    pub(crate) fn quantize(x: f64, y: f64) -> Option<Self> {
        let scale = f64::from(FIXED_POINT_SCALE);
        let (x, y) = ((x * scale + 0.5).floor(), (y * scale + 0.5).floor());
        let limit = f64::from(MAX_COORDINATE);
        if !(x.abs() <= limit && y.abs() <= limit) {
            return None;
        }
        Some(Point::new(x as i32, y as i32))
    }

    /// Component-wise arithmetic shift right (floor division by a
    /// power of two).
    #[inline]
    pub(crate) fn shr(self, bits: u32) -> Self {
        Point::new(self.x >> bits, self.y >> bits)
    }

    /// Checks that the lowest `bits` bits of both components are zero.
    #[inline]
    pub(crate) fn is_multiple_of_pow2(self, bits: u32) -> bool {
        let mask = (1 << bits) - 1;
        (self.x | self.y) & mask == 0
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Lexicographic ordering by `y` and then by `x`.
impl Ord for Point {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Point {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline]
pub fn cross(u: Point, v: Point) -> i64 {
    i64::from(u.x) * i64::from(v.y) - i64::from(u.y) * i64::from(v.x)
}

#[inline]
pub fn dot(u: Point, v: Point) -> i64 {
    i64::from(u.x) * i64::from(v.x) + i64::from(u.y) * i64::from(v.y)
}

/// Twice the signed area of the triangle `p`, `v1`, `v2`.
///
/// Positive if `p` is to the right of the line `v1 -> v2` (clockwise
/// order in a y-down coordinate system), negative if it is to the left
/// and zero if the three points are collinear.
#[inline]
pub fn point_distance_from_line(p: Point, v1: Point, v2: Point) -> i64 {
    cross(v2 - v1, p - v1)
}

/// A reduced fraction `numerator / denominator` in `[0, 1)`.
///
/// A zero denominator marks an invalid fraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

fn gcd(mut x: u64, mut y: u64) -> u64 {
    while y != 0 {
        let z = y;
        y = x % y;
        x = z;
    }
    x
}

impl Fraction {
    /// Create a gcd-reduced fraction. Requires `n < d`.
    pub fn new(n: u64, d: u64) -> Self {
        debug_assert!(n < d, "fraction must lie in [0, 1)");
        if n == 0 {
            return Fraction {
                numerator: 0,
                denominator: 1,
            };
        }
        let g = gcd(n, d);
        Fraction {
            numerator: n / g,
            denominator: d / g,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.denominator != 0
    }

    /// Checks if the fraction is at least one half.
    #[inline]
    fn rounds_up(&self) -> bool {
        // numerator < denominator, so the doubling can't overflow for
        // denominators below 2^63.
        u128::from(self.numerator) * 2 >= u128::from(self.denominator)
    }
}

/// An exact intersection point: an integer `upper_left` corner plus a
/// fractional offset along each axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionPoint {
    pub upper_left: Point,
    pub x_offset: Fraction,
    pub y_offset: Fraction,
}

impl IntersectionPoint {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.x_offset.is_valid() && self.y_offset.is_valid()
    }

    /// Checks if the point lies exactly on the integer grid.
    #[inline]
    pub fn is_accurate(&self) -> bool {
        self.x_offset.numerator == 0 && self.y_offset.numerator == 0
    }

    /// Nearest grid point, rounding halves up on each axis.
    pub fn round(&self) -> Point {
        let mut result = self.upper_left;
        if self.x_offset.rounds_up() {
            result.x += 1;
        }
        if self.y_offset.rounds_up() {
            result.y += 1;
        }
        result
    }
}

/// Integer part and fractional offset of `base + num / det` where
/// `det > 0`, for a component of the intersection point.
#[inline]
fn offset_along(base: i32, num: i128, det: i128) -> (i32, Fraction) {
    // `num` is non-negative: it is `-v * d` with `v` and `d` of
    // opposite signs (or zero).
    debug_assert!(num >= 0 && det > 0);
    let whole = base as i128 + num / det;
    let frac = Fraction::new((num % det) as u64, det as u64);
    (whole as i32, frac)
}

/// Exact intersection of the segments `u1 -> u2` and `v1 -> v2`.
///
/// Only crossings strictly inside both segments count: parallel
/// segments (even if overlapping) and segments meeting at an end point
/// yield an invalid result.
pub fn intersection_point(u1: Point, u2: Point, v1: Point, v2: Point) -> IntersectionPoint {
    let invalid = IntersectionPoint::default();

    let u = u2 - u1;
    let v = v2 - v1;
    let mut d1 = cross(u, v1 - u1);
    let mut d2 = cross(u, v2 - u1);
    let mut det = d2 - d1;
    let mut d3 = cross(v, u1 - v1);
    let mut d4 = d3 - det;
    debug_assert_eq!(d4, cross(v, u2 - v1));

    // The intersection point can be expressed as:
    // v1 - v * d1/det
    // v2 - v * d2/det
    // u1 + u * d3/det
    // u2 + u * d4/det
    if det == 0 {
        return invalid;
    }
    if det < 0 {
        det = -det;
        d1 = -d1;
        d2 = -d2;
        d3 = -d3;
        d4 = -d4;
    }

    // Interior crossing iff d1 < 0, d2 > 0, d3 > 0 and d4 < 0.
    if d1 >= 0 || d2 <= 0 || d3 <= 0 || d4 >= 0 {
        return invalid;
    }

    let det = i128::from(det);
    let (x, x_offset) = if v.x >= 0 {
        offset_along(v1.x, -i128::from(v.x) * i128::from(d1), det)
    } else {
        offset_along(v2.x, -i128::from(v.x) * i128::from(d2), det)
    };
    let (y, y_offset) = if v.y >= 0 {
        offset_along(v1.y, -i128::from(v.y) * i128::from(d1), det)
    } else {
        offset_along(v2.y, -i128::from(v.y) * i128::from(d2), det)
    };

    IntersectionPoint {
        upper_left: Point::new(x, y),
        x_offset,
        y_offset,
    }
}
