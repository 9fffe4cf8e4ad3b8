use euclid::default::{Point2D, Transform2D};
use geo::Coordinate;
use log::debug;

use crate::{
    bezier::split_cubic,
    element::{Element, ElementStore},
    error::SimplifyError,
    fixed::{intersection_point, Point},
};

/// Tag of one coordinate of a path.
///
/// Every coordinate carries exactly one tag. A cubic segment takes three
/// coordinates: `CurveTo` for the first control point, then
/// `CurveToData` for the second control point and for the end point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathElement {
    MoveTo,
    LineTo,
    CurveTo,
    CurveToData,
}

/// Tolerance (in transformed units) of the test that detects cubics
/// which are really degree-elevated quadratics.
const QUADRATIC_TOLERANCE: f64 = 1e-3;

/// Bisection depth limit when making cubics simple.
const MAX_CUBIC_SPLITS: u32 = 16;

/// Turns a path or a polygon into elements over quantized points.
pub(crate) struct Decomposer<'a> {
    transform: &'a Transform2D<f64>,
    points: &'a mut Vec<Point>,
    elements: &'a mut ElementStore,
}

/// Position of the pen inside the current subpath.
#[derive(Debug, Clone, Copy)]
struct Pen {
    start: u32,
    previous: u32,
    /// Transformed, unquantized position of `previous`.
    position: Point2D<f64>,
}

impl<'a> Decomposer<'a> {
    pub fn new(
        transform: &'a Transform2D<f64>,
        points: &'a mut Vec<Point>,
        elements: &'a mut ElementStore,
    ) -> Self {
        Decomposer {
            transform,
            points,
            elements,
        }
    }

    fn map(&self, coord: Coordinate<f64>) -> Point2D<f64> {
        self.transform.transform_point(Point2D::new(coord.x, coord.y))
    }

    fn quantize(&self, p: Point2D<f64>) -> Result<Point, SimplifyError> {
        Point::quantize(p.x, p.y).ok_or(SimplifyError::CoordinateOutOfRange { x: p.x, y: p.y })
    }

    fn push_point(&mut self, p: Point) -> u32 {
        self.points.push(p);
        self.points.len() as u32 - 1
    }

    /// Index of the point to draw to from `pen`, reusing the pen
    /// position or the subpath start if `p` equals one of them.
    fn target_index(&mut self, pen: &Pen, p: Point) -> u32 {
        if p == self.points[pen.previous as usize] {
            pen.previous
        } else if p == self.points[pen.start as usize] {
            pen.start
        } else {
            self.push_point(p)
        }
    }

    fn push_line(&mut self, from: u32, to: u32) {
        if self.points[from as usize] == self.points[to as usize] {
            return;
        }
        let element = Element::new_line(self.points, from, to);
        self.elements.new_element(element);
    }

    fn push_quadratic(&mut self, from: u32, ctrl: Point, to: u32) {
        let mut element = Element::new_line(self.points, from, to);
        if element.set_quadratic(self.points, from, ctrl, to)
            || self.points[from as usize] != self.points[to as usize]
        {
            self.elements.new_element(element);
        }
    }

    fn push_cubic(&mut self, from: u32, v: Point, w: Point, to: u32) {
        let mut element = Element::new_line(self.points, from, to);
        if element.set_cubic(self.points, from, v, w, to)
            || self.points[from as usize] != self.points[to as usize]
        {
            self.elements.new_element(element);
        }
    }

    /// Add a cubic, simplified to a line if it is flat. A cubic whose
    /// control polygon crosses itself, or that ends where it starts, is
    /// bisected until its pieces do neither, at most `depth` times.
    fn push_cubic_and_simplify(&mut self, from: u32, v: Point, w: Point, to: u32, depth: u32) {
        let (u, q) = (self.points[from as usize], self.points[to as usize]);
        if depth == 0 || (u != q && !intersection_point(u, v, w, q).is_valid()) {
            self.push_cubic(from, v, w, to);
            return;
        }
        let ([c1, c2, mid, c3, c4], _) = split_cubic(u, v, w, q);
        let m = self.push_point(mid);
        self.push_cubic_and_simplify(from, c1, c2, m, depth - 1);
        self.push_cubic_and_simplify(m, c3, c4, to, depth - 1);
    }

    /// Close the subpath with a line back to its start.
    fn close(&mut self, pen: Option<Pen>) {
        if let Some(pen) = pen {
            self.push_line(pen.previous, pen.start);
        }
    }

    /// Decompose a path given as one tag per coordinate.
    pub fn decompose_path(
        &mut self,
        tags: &[PathElement],
        coords: &[Coordinate<f64>],
    ) -> Result<(), SimplifyError> {
        if tags.len() != coords.len() {
            return Err(SimplifyError::MalformedPath {
                index: tags.len().min(coords.len()),
                reason: "element and coordinate counts differ",
            });
        }
        self.elements.allocate(tags.len());
        self.points.reserve(tags.len());

        let mut pen: Option<Pen> = None;
        let mut i = 0;
        while i < tags.len() {
            match tags[i] {
                PathElement::MoveTo => {
                    self.close(pen);
                    let position = self.map(coords[i]);
                    let index = self.quantize(position).map(|p| self.push_point(p))?;
                    pen = Some(Pen {
                        start: index,
                        previous: index,
                        position,
                    });
                    i += 1;
                }
                PathElement::LineTo => {
                    let mut current = pen.ok_or(SimplifyError::MalformedPath {
                        index: i,
                        reason: "path must start with a MoveTo",
                    })?;
                    let position = self.map(coords[i]);
                    let to = self.quantize(position)?;
                    let to = self.target_index(&current, to);
                    self.push_line(current.previous, to);
                    current.previous = to;
                    current.position = position;
                    pen = Some(current);
                    i += 1;
                }
                PathElement::CurveTo => {
                    let mut current = pen.ok_or(SimplifyError::MalformedPath {
                        index: i,
                        reason: "path must start with a MoveTo",
                    })?;
                    if i + 2 >= tags.len()
                        || tags[i + 1] != PathElement::CurveToData
                        || tags[i + 2] != PathElement::CurveToData
                    {
                        return Err(SimplifyError::MalformedPath {
                            index: i,
                            reason: "CurveTo must be followed by two CurveToData",
                        });
                    }
                    let c1 = self.map(coords[i]);
                    let c2 = self.map(coords[i + 1]);
                    let end = self.map(coords[i + 2]);
                    let (q1, q2) = (self.quantize(c1)?, self.quantize(c2)?);
                    let q_end = self.quantize(end)?;
                    let to = self.target_index(&current, q_end);

                    // A degree-elevated quadratic has both control points
                    // on the lines from its end points to the same
                    // quadratic control point.
                    let prev = current.position;
                    let x1 = prev + (c1 - prev) * 1.5;
                    let x2 = end + (c2 - end) * 1.5;
                    if (x1.x - x2.x).abs() < QUADRATIC_TOLERANCE
                        && (x1.y - x2.y).abs() < QUADRATIC_TOLERANCE
                    {
                        let ctrl = self.quantize(x1)?;
                        self.push_quadratic(current.previous, ctrl, to);
                    } else {
                        let from = current.previous;
                        self.push_cubic_and_simplify(from, q1, q2, to, MAX_CUBIC_SPLITS);
                    }

                    current.previous = to;
                    current.position = end;
                    pen = Some(current);
                    i += 3;
                }
                PathElement::CurveToData => {
                    return Err(SimplifyError::MalformedPath {
                        index: i,
                        reason: "CurveToData without a preceding CurveTo",
                    });
                }
            }
        }
        self.close(pen);

        debug!(
            "decompose_path: {} elements over {} points",
            self.elements.len(),
            self.points.len()
        );
        Ok(())
    }

    /// Decompose an implicitly closed polygon.
    ///
    /// Consecutive duplicate points are dropped, as are trailing points
    /// equal to the first one.
    pub fn decompose_polygon(&mut self, coords: &[Coordinate<f64>]) -> Result<(), SimplifyError> {
        let first = self.points.len();
        self.points.reserve(coords.len());
        for &coord in coords {
            let p = self.quantize(self.map(coord))?;
            if self.points.len() == first || self.points[self.points.len() - 1] != p {
                self.points.push(p);
            }
        }
        while self.points.len() > first + 1
            && self.points[self.points.len() - 1] == self.points[first]
        {
            self.points.pop();
        }

        let count = self.points.len() - first;
        if count < 2 {
            return Ok(());
        }
        self.elements.allocate(count);
        let mut previous = (first + count - 1) as u32;
        for i in first..first + count {
            let element = Element::new_line(self.points, previous, i as u32);
            self.elements.new_element(element);
            previous = i as u32;
        }

        debug!("decompose_polygon: {} elements", self.elements.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Degree;
    use crate::fixed::FIXED_POINT_SCALE;

    const S: i32 = FIXED_POINT_SCALE;

    fn coords(pts: &[(f64, f64)]) -> Vec<Coordinate<f64>> {
        pts.iter().map(|&(x, y)| Coordinate { x, y }).collect()
    }

    fn decompose(
        tags: &[PathElement],
        pts: &[(f64, f64)],
    ) -> Result<(Vec<Point>, ElementStore), SimplifyError> {
        let transform = Transform2D::identity();
        let mut points = vec![];
        let mut elements = ElementStore::default();
        Decomposer::new(&transform, &mut points, &mut elements).decompose_path(tags, &coords(pts))?;
        Ok((points, elements))
    }

    #[test]
    fn test_implicit_close() {
        use PathElement::*;
        let (points, elements) =
            decompose(&[MoveTo, LineTo, LineTo], &[(0., 0.), (4., 0.), (0., 3.)]).unwrap();
        assert_eq!(points.len(), 3);
        let lines: Vec<_> = elements.iter().map(|e| e.points().to_vec()).collect();
        assert_eq!(lines, vec![vec![0, 1], vec![1, 2], vec![2, 0]]);
    }

    #[test]
    fn test_explicit_close_reuses_start() {
        use PathElement::*;
        let (points, elements) = decompose(
            &[MoveTo, LineTo, LineTo, LineTo, LineTo],
            &[(0., 0.), (4., 0.), (4., 0.), (0., 3.), (0., 0.)],
        )
        .unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[crate::element::ElementId(2)].points(), &[2, 0]);
    }

    #[test]
    fn test_transform_is_applied() {
        let transform =
            Transform2D::scale(2., 3.).then_translate(euclid::default::Vector2D::new(1., 0.));
        let mut points = vec![];
        let mut elements = ElementStore::default();
        Decomposer::new(&transform, &mut points, &mut elements)
            .decompose_polygon(&coords(&[(0., 0.), (1., 0.), (0., 1.)]))
            .unwrap();
        assert_eq!(points, vec![Point::new(S, 0), Point::new(3 * S, 0), Point::new(S, 3 * S)]);
    }

    #[test]
    fn test_curves() {
        use PathElement::*;
        // Degree-elevated quadratic with control point (5, 10).
        let (points, elements) = decompose(
            &[MoveTo, CurveTo, CurveToData, CurveToData],
            &[(0., 0.), (10. / 3., 20. / 3.), (20. / 3., 20. / 3.), (10., 0.)],
        )
        .unwrap();
        let first = &elements[crate::element::ElementId(0)];
        assert_eq!(first.degree, Degree::Quadratic);
        assert_eq!(points[first.indices[1] as usize], Point::new(5 * S, 10 * S));

        // A real cubic, and a flat one that becomes a line.
        let (_, elements) = decompose(
            &[MoveTo, CurveTo, CurveToData, CurveToData, CurveTo, CurveToData, CurveToData],
            &[(0., 0.), (0., 10.), (10., 10.), (10., 0.), (12., 0.), (14., 0.), (20., 0.)],
        )
        .unwrap();
        let degrees: Vec<_> = elements.iter().map(|e| e.degree).collect();
        assert_eq!(degrees, vec![Degree::Cubic, Degree::Line, Degree::Line]);
    }

    #[test]
    fn test_self_intersecting_cubic_is_split() {
        use PathElement::*;
        let (_, elements) = decompose(
            &[MoveTo, CurveTo, CurveToData, CurveToData],
            &[(0., 0.), (20., 10.), (0., 10.), (20., 0.)],
        )
        .unwrap();
        // Two cubic halves plus the closing line.
        let degrees: Vec<_> = elements.iter().map(|e| e.degree).collect();
        assert_eq!(degrees, vec![Degree::Cubic, Degree::Cubic, Degree::Line]);
    }

    #[test]
    fn test_looping_cubic_is_split_until_simple() {
        use PathElement::*;
        // After one bisection, the second half still has crossing legs.
        let (points, elements) = decompose(
            &[MoveTo, CurveTo, CurveToData, CurveToData],
            &[(6., 2.), (20., 5.), (18., 14.), (18., 4.)],
        )
        .unwrap();
        // Three pieces (two of them flat enough for lines) and the closing line.
        assert_eq!(elements.len(), 4);
        for e in elements.iter().filter(|e| e.degree == Degree::Cubic) {
            let p = |i: usize| points[e.indices[i] as usize];
            assert_ne!(p(0), p(3));
            assert!(!intersection_point(p(0), p(1), p(2), p(3)).is_valid());
        }
    }

    #[test]
    fn test_polygon_drops_duplicates() {
        let transform = Transform2D::identity();
        let mut points = vec![];
        let mut elements = ElementStore::default();
        Decomposer::new(&transform, &mut points, &mut elements)
            .decompose_polygon(&coords(&[
                (0., 0.),
                (1., 0.),
                (1., 0.),
                (1., 1.),
                (0., 0.),
                (0., 0.),
            ]))
            .unwrap();
        assert_eq!(points.len(), 3);
        let lines: Vec<_> = elements.iter().map(|e| e.points().to_vec()).collect();
        assert_eq!(lines, vec![vec![2, 0], vec![0, 1], vec![1, 2]]);
    }

    #[test]
    fn test_malformed_paths() {
        use PathElement::*;
        let err = decompose(&[LineTo], &[(0., 0.)]).unwrap_err();
        assert!(matches!(err, SimplifyError::MalformedPath { index: 0, .. }));

        let err = decompose(&[MoveTo, CurveTo, CurveToData], &[(0., 0.), (1., 1.), (2., 0.)])
            .unwrap_err();
        assert!(matches!(err, SimplifyError::MalformedPath { index: 1, .. }));

        let err = decompose(&[MoveTo, CurveToData], &[(0., 0.), (1., 1.)]).unwrap_err();
        assert!(matches!(err, SimplifyError::MalformedPath { index: 1, .. }));

        let err = decompose(&[MoveTo, LineTo], &[(0., 0.)]).unwrap_err();
        assert!(matches!(err, SimplifyError::MalformedPath { .. }));

        let err = decompose(&[MoveTo, LineTo], &[(0., 0.), (f64::INFINITY, 0.)]).unwrap_err();
        assert!(matches!(err, SimplifyError::CoordinateOutOfRange { .. }));
    }
}
