//! Converts vector paths into sets of non-intersecting polygons.
//!
//! A path of lines, quadratic and cubic Bézier curves is quantized to
//! a fixed-point grid, and its elements are split until no two of them
//! cross. A plane sweep then resolves the winding numbers, drops the
//! edges that do not bound the filled area and links the rest into
//! closed, consistently oriented loops. The loops are written out as a
//! vertex buffer plus an index buffer, with curves flattened, ready for
//! a triangulator.
//!
//! 1. [Fixed-point kernel](#fixed-point-kernel)
//! 1. [Simplification](#simplification)
//!
//! # Fixed-point kernel
//!
//! All geometry is exact: coordinates are scaled by
//! [`FIXED_POINT_SCALE`] and rounded to integers, and crossings are
//! computed as exact fractions (see [`fixed::intersection_point`])
//! before they are rounded back onto the grid. The de Casteljau
//! routines used to split and flatten curves live in [`bezier`].
//!
//! # Simplification
//!
//! Use a [`PathSimplifier`] with a path given as one [`PathElement`]
//! tag per coordinate, or with a plain polygon.
//!
//! ```rust
//! use euclid::default::Transform2D;
//! use geo::Coordinate;
//! use geo_path_simplifier::{PathSimplifier, Point, SimplifiedPath};
//!
//! // A bow-tie: its diagonals cross at (0.5, 0.5).
//! let points: Vec<Coordinate<f64>> = vec![
//!     (0., 0.).into(),
//!     (1., 1.).into(),
//!     (1., 0.).into(),
//!     (0., 1.).into(),
//! ];
//! let mut output = SimplifiedPath::new();
//! PathSimplifier::new()
//!     .simplify_polygon(&points, &Transform2D::identity(), &mut output)
//!     .unwrap();
//!
//! // The crossing becomes a new vertex, visited by both lobes.
//! assert_eq!(output.vertices.len(), 5);
//! assert_eq!(output.vertices[4], Point::new(128, 128));
//! assert_eq!(output.indices.iter().filter(|&&i| i == 4).count(), 2);
//! ```
mod active;
mod bvh;
mod element;
mod emit;
mod events;
mod intersections;
mod sweep;

pub mod bezier;

pub mod fixed;
pub use fixed::{Point, FIXED_POINT_SCALE, MAX_COORDINATE};

mod path;
pub use path::PathElement;

mod error;
pub use error::SimplifyError;

mod simplifier;
pub use simplifier::{FillRule, PathSimplifier, SimplifiedPath, SimplifyOptions, END_OF_POLYGON};

#[cfg(test)]
#[path = "../benches/utils/random.rs"]
pub mod random;
