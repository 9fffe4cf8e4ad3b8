use log::debug;

use crate::{
    bezier::{flatten_cubic, flatten_quadratic, split_cubic, split_quadratic},
    element::{Degree, ElementStore},
    fixed::Point,
    simplifier::END_OF_POLYGON,
};

/// Writes the linked loops into `indices`, one sentinel-terminated run
/// per loop. Curves are flattened; their intermediate points are
/// appended to `points`. Returns the number of loops.
pub(crate) fn fill_indices(
    elements: &mut ElementStore,
    points: &mut Vec<Point>,
    indices: &mut Vec<u32>,
) -> usize {
    for e in elements.iter_mut() {
        e.processed = false;
    }

    let mut loops = 0;
    for start in elements.ids() {
        if elements[start].processed || elements[start].next.is_none() {
            continue;
        }
        let mut current = start;
        loop {
            let e = &mut elements[current];
            let p = |i: usize| points[e.indices[i] as usize];
            indices.push(e.indices[0]);
            match e.degree {
                Degree::Line => {}
                Degree::Quadratic => {
                    let (u, v, w) = (p(0), p(1), p(2));
                    subdivide_quadratic(points, indices, u, v, w);
                }
                Degree::Cubic => {
                    let (u, v, w, q) = (p(0), p(1), p(2), p(3));
                    subdivide_cubic(points, indices, u, v, w, q);
                }
            }
            e.processed = true;
            current = e.next.expect("loops are closed");
            if current == start {
                break;
            }
        }
        indices.push(END_OF_POLYGON);
        loops += 1;
    }

    debug!("fill_indices: {} loops, {} indices", loops, indices.len());
    loops
}

fn push_point(points: &mut Vec<Point>, indices: &mut Vec<u32>, p: Point) {
    indices.push(points.len() as u32);
    points.push(p);
}

/// Emit the interior points of a flattened quadratic.
fn subdivide_quadratic(
    points: &mut Vec<Point>,
    indices: &mut Vec<u32>,
    u: Point,
    v: Point,
    w: Point,
) {
    if flatten_quadratic(u, v, w) {
        return;
    }
    let ([c1, mid, c2], _) = split_quadratic(u, v, w);
    subdivide_quadratic(points, indices, u, c1, mid);
    push_point(points, indices, mid);
    subdivide_quadratic(points, indices, mid, c2, w);
}

/// Emit the interior points of a flattened cubic.
fn subdivide_cubic(
    points: &mut Vec<Point>,
    indices: &mut Vec<u32>,
    u: Point,
    v: Point,
    w: Point,
    q: Point,
) {
    if flatten_cubic(u, v, w, q) {
        return;
    }
    let ([c1, c2, mid, c3, c4], _) = split_cubic(u, v, w, q);
    subdivide_cubic(points, indices, u, c1, c2, mid);
    push_point(points, indices, mid);
    subdivide_cubic(points, indices, mid, c3, c4, q);
}
