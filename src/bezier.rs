//! De Casteljau bisection and flatness tests on fixed-point control
//! points.

use crate::fixed::{cross, Point, FIXED_POINT_SCALE};

const SCALE_SQ: i64 = (FIXED_POINT_SCALE as i64) * (FIXED_POINT_SCALE as i64);

/// Length (in fixed-point units, L1 norm) below which a curve is
/// always considered flat.
const FLAT_LENGTH: i64 = 2 * FIXED_POINT_SCALE as i64;

#[inline]
fn l1(p: Point) -> i64 {
    i64::from(p.x).abs() + i64::from(p.y).abs()
}

/// Checks if the quadratic `u, v, w` can be replaced by the line `u -> w`.
///
/// A curve is flat if its control polygon is nearly straight, or if it
/// is short.
pub fn flatten_quadratic(u: Point, v: Point, w: Point) -> bool {
    let deltas = [v - u, w - v];
    let d = cross(deltas[0], deltas[1]).abs();
    let l = l1(deltas[0]) + l1(deltas[1]);
    d < SCALE_SQ * 3 / 2 || l <= FLAT_LENGTH
}

/// Checks if the cubic `u, v, w, q` can be replaced by the line `u -> q`.
pub fn flatten_cubic(u: Point, v: Point, w: Point, q: Point) -> bool {
    let deltas = [v - u, w - v, q - w, q - u];
    let d = cross(deltas[0], deltas[1]).abs()
        + cross(deltas[1], deltas[2]).abs()
        + cross(deltas[0], deltas[3]).abs()
        + cross(deltas[3], deltas[2]).abs();
    let l = l1(deltas[0]) + l1(deltas[1]) + l1(deltas[2]);
    d < SCALE_SQ * 3 || l <= FLAT_LENGTH
}

/// Bisect the quadratic `u, v, w` at `t = 1/2`.
///
/// Returns `[ctrl1, mid, ctrl2]`: the halves are `u, ctrl1, mid` and
/// `mid, ctrl2, w`. The flag is `true` if no precision was lost by the
/// integer halving.
pub fn split_quadratic(u: Point, v: Point, w: Point) -> ([Point; 3], bool) {
    let a = u + v;
    let c = v + w;
    let b = a + c;
    let accurate =
        (a.is_multiple_of_pow2(1) && c.is_multiple_of_pow2(1)) && b.is_multiple_of_pow2(2);
    ([a.shr(1), b.shr(2), c.shr(1)], accurate)
}

/// Bisect the cubic `u, v, w, q` at `t = 1/2`.
///
/// Returns `[c1, c2, mid, c3, c4]`: the halves are `u, c1, c2, mid` and
/// `mid, c3, c4, q`. The flag is `true` if no precision was lost.
pub fn split_cubic(u: Point, v: Point, w: Point, q: Point) -> ([Point; 5], bool) {
    let r0 = u + v;
    let vw = v + w;
    let r4 = w + q;
    let r1 = r0 + vw;
    let r3 = vw + r4;
    let r2 = r1 + r3;
    let accurate = r0.is_multiple_of_pow2(1)
        && r4.is_multiple_of_pow2(1)
        && r1.is_multiple_of_pow2(2)
        && r3.is_multiple_of_pow2(2)
        && r2.is_multiple_of_pow2(3);
    (
        [r0.shr(1), r1.shr(2), r2.shr(3), r3.shr(2), r4.shr(1)],
        accurate,
    )
}
