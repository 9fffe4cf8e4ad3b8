use euclid::default::Transform2D;
use geo::Coordinate;
use log::debug;

use crate::{
    active::ActiveEdges,
    bvh::Bvh,
    element::ElementStore,
    emit::fill_indices,
    error::SimplifyError,
    events::Event,
    fixed::Point,
    intersections::IntersectionRemover,
    path::{Decomposer, PathElement},
    sweep::Connector,
};

/// Index value separating the polygons of a [`SimplifiedPath`].
pub const END_OF_POLYGON: u32 = u32::MAX;

/// Rule deciding which parts of the path are filled.
///
/// See the [SVG specification](https://www.w3.org/TR/SVG/painting.html#FillRuleProperty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillRule {
    EvenOdd,
    NonZero,
}

impl Default for FillRule {
    fn default() -> Self {
        FillRule::EvenOdd
    }
}

impl FillRule {
    /// Checks if an element with the given effective winding (the
    /// larger of the windings on its two sides) is a boundary of the
    /// filled area.
    #[inline]
    pub(crate) fn retains(self, winding: i32) -> bool {
        match self {
            FillRule::EvenOdd => true,
            FillRule::NonZero => winding == 0 || winding == 1,
        }
    }
}

/// Parameters of [`PathSimplifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifyOptions {
    /// Default value: `EvenOdd`.
    pub fill_rule: FillRule,

    /// Maximum number of elements checked for intersections before
    /// giving up with [`SimplifyError::IterationLimitExceeded`].
    ///
    /// Default value: `None`, a limit proportional to the number of
    /// elements, which grows as elements are split.
    pub max_iterations: Option<usize>,
}

impl SimplifyOptions {
    pub const DEFAULT: Self = SimplifyOptions {
        fill_rule: FillRule::EvenOdd,
        max_iterations: None,
    };

    #[inline]
    pub fn even_odd() -> Self {
        Self::DEFAULT
    }

    #[inline]
    pub fn non_zero() -> Self {
        Self::DEFAULT.with_fill_rule(FillRule::NonZero)
    }

    #[inline]
    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Output of a simplification: fixed-point vertices, and indices into
/// them describing closed polygons separated by [`END_OF_POLYGON`].
///
/// The vertices are in the fixed-point space of the input (scaled by
/// [`FIXED_POINT_SCALE`](crate::FIXED_POINT_SCALE)) and may include
/// points no polygon refers to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimplifiedPath {
    pub vertices: Vec<Point>,
    pub indices: Vec<u32>,
}

impl SimplifiedPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Iterate over the polygons as slices of vertex indices.
    pub fn polygons(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.indices
            .split(|&i| i == END_OF_POLYGON)
            .filter(|polygon| !polygon.is_empty())
    }
}

/// Converts paths into non-intersecting polygons.
///
/// A simplifier keeps its working buffers between runs, so reusing one
/// for many paths avoids allocations.
#[derive(Debug, Default)]
pub struct PathSimplifier {
    options: SimplifyOptions,
    elements: ElementStore,
    bvh: Bvh,
    active: ActiveEdges,
    events: Vec<Event>,
}

impl PathSimplifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SimplifyOptions) -> Self {
        PathSimplifier {
            options,
            ..Self::default()
        }
    }

    #[inline]
    pub fn options(&self) -> &SimplifyOptions {
        &self.options
    }

    /// Simplify the path given by one tag per coordinate. Every
    /// coordinate is mapped through `transform` before it is quantized.
    pub fn simplify_path(
        &mut self,
        elements: &[PathElement],
        points: &[Coordinate<f64>],
        transform: &Transform2D<f64>,
        output: &mut SimplifiedPath,
    ) -> Result<(), SimplifyError> {
        self.reset(output);
        let result = Decomposer::new(transform, &mut output.vertices, &mut self.elements)
            .decompose_path(elements, points);
        let result = result.and_then(|()| self.simplify(output));
        Self::finish(result, output)
    }

    /// Simplify the closed polygon through `points`.
    pub fn simplify_polygon(
        &mut self,
        points: &[Coordinate<f64>],
        transform: &Transform2D<f64>,
        output: &mut SimplifiedPath,
    ) -> Result<(), SimplifyError> {
        self.reset(output);
        let result = Decomposer::new(transform, &mut output.vertices, &mut self.elements)
            .decompose_polygon(points);
        let result = result.and_then(|()| self.simplify(output));
        Self::finish(result, output)
    }

    fn reset(&mut self, output: &mut SimplifiedPath) {
        output.clear();
        self.elements.clear();
        self.bvh.free();
        self.active.clear();
        self.events.clear();
    }

    fn finish(
        result: Result<(), SimplifyError>,
        output: &mut SimplifiedPath,
    ) -> Result<(), SimplifyError> {
        if let Err(err) = &result {
            debug!("simplify: {}", err);
            output.clear();
        }
        result
    }

    fn simplify(&mut self, output: &mut SimplifiedPath) -> Result<(), SimplifyError> {
        if self.elements.is_empty() {
            return Ok(());
        }
        IntersectionRemover::new(&mut self.elements, &mut output.vertices, &mut self.bvh)
            .run(self.options.max_iterations)?;
        Connector::new(
            &mut self.elements,
            &output.vertices,
            &mut self.active,
            &mut self.events,
            self.options.fill_rule,
        )
        .run();
        fill_indices(&mut self.elements, &mut output.vertices, &mut output.indices);
        Ok(())
    }
}
