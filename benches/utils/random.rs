use std::f64::consts::PI;

use geo::{Coordinate, Line, LineString, Polygon, Rect};

use rand::Rng;
use rand_distr::Standard;

#[inline]
pub fn uniform_point<R: Rng>(rng: &mut R, bounds: Rect<f64>) -> Coordinate<f64> {
    let coords: [f64; 2] = rng.sample(Standard);
    let dims = bounds.max() - bounds.min();
    Coordinate {
        x: bounds.min().x + dims.x * coords[0],
        y: bounds.min().y + dims.y * coords[1],
    }
}

#[inline]
#[allow(dead_code)]
pub fn uniform_line<R: Rng>(rng: &mut R, bounds: Rect<f64>) -> Line<f64> {
    Line::new(uniform_point(rng, bounds), uniform_point(rng, bounds))
}

/// A ring through `steps` uniform points of the square of half-width
/// `size`. Usually self-intersecting.
#[allow(dead_code)]
pub fn random_ring<R: Rng>(mut rng: R, steps: usize, size: f64) -> LineString<f64> {
    let bounds = Rect::new((-size, -size), (size, size));
    (0..steps).map(|_| uniform_point(&mut rng, bounds)).collect()
}

/// A simple star-shaped polygon with `steps` vertices at random radii
/// between 10 and 100, and jittered angles.
#[allow(dead_code)]
pub fn circular_polygon<R: Rng>(mut rng: R, steps: usize) -> Polygon<f64> {
    let angle_step = 2. * PI / steps as f64;
    let max_nudge = 0.95 * angle_step / 2.;

    let ring: LineString<f64> = (0..steps)
        .map(|i| {
            let radius = 10. + 90. * rng.sample::<f64, _>(Standard);
            let nudge = max_nudge * (2. * rng.sample::<f64, _>(Standard) - 1.);
            let angle = i as f64 * angle_step + nudge;
            Coordinate {
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(ring, vec![])
}
