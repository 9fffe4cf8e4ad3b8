use std::f64::consts::PI;

use criterion::*;
use euclid::default::Transform2D;
use geo::Coordinate;
use geo_path_simplifier::{PathElement, PathSimplifier, SimplifiedPath};

#[path = "utils/random.rs"]
mod random;
use rand::{thread_rng, Rng};
use random::*;

/// A closed path of `steps` cubics around the origin, each ending at a
/// random radius. Neighbouring curves bulge into each other often.
fn wobbly_circle<R: Rng>(rng: &mut R, steps: usize) -> (Vec<PathElement>, Vec<Coordinate<f64>>) {
    let at = |radius: f64, angle: f64| Coordinate {
        x: radius * angle.cos(),
        y: radius * angle.sin(),
    };
    let step = 2. * PI / steps as f64;

    let mut tags = vec![PathElement::MoveTo];
    let mut coords = vec![at(100., 0.)];
    for i in 0..steps {
        let angle = i as f64 * step;
        let radius = if i + 1 == steps { 100. } else { rng.gen_range(50.0..150.0) };
        tags.extend_from_slice(&[
            PathElement::CurveTo,
            PathElement::CurveToData,
            PathElement::CurveToData,
        ]);
        coords.push(at(rng.gen_range(50.0..150.0), angle + step / 3.));
        coords.push(at(rng.gen_range(50.0..150.0), angle + 2. * step / 3.));
        coords.push(at(radius, angle + step));
    }
    (tags, coords)
}

/// A scribble of cubics with uniformly random control points. Nearly
/// every pair of curves crosses.
fn scribble<R: Rng>(rng: &mut R, curves: usize) -> (Vec<PathElement>, Vec<Coordinate<f64>>) {
    let bounds = geo::Rect::new((0., 0.), (256., 256.));
    let mut tags = vec![PathElement::MoveTo];
    let mut coords = vec![uniform_point(rng, bounds)];
    for _ in 0..curves {
        tags.extend_from_slice(&[
            PathElement::CurveTo,
            PathElement::CurveToData,
            PathElement::CurveToData,
        ]);
        coords.extend((0..3).map(|_| uniform_point(rng, bounds)));
    }
    (tags, coords)
}

fn curve_paths(c: &mut Criterion) {
    let transform = Transform2D::identity();
    let mut simplifier = PathSimplifier::new();
    let mut output = SimplifiedPath::new();

    let (tags, coords) = wobbly_circle(&mut thread_rng(), 512);
    c.bench_function("Wobbly circle of cubics", |b| {
        b.iter(|| {
            simplifier.simplify_path(&tags, &coords, &transform, &mut output).unwrap();
            black_box(output.indices.len());
        })
    });

    let mut group = c.benchmark_group("Cubic scribble");
    for &curves in &[16, 64, 128] {
        let path = scribble(&mut thread_rng(), curves);
        group.bench_with_input(BenchmarkId::from_parameter(curves), &path, |b, (tags, coords)| {
            b.iter(|| {
                simplifier.simplify_path(tags, coords, &transform, &mut output).unwrap();
                black_box(output.indices.len());
            })
        });
    }
    group.finish();
}

criterion_group!(curves, curve_paths);
criterion_main!(curves);
