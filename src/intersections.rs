use log::debug;
use smallvec::SmallVec;

use crate::{
    bezier::{split_cubic, split_quadratic},
    bvh::{Bvh, BvhKind, BvhNodeId},
    element::{Degree, ElementId, ElementStore},
    error::SimplifyError,
    fixed::{dot, intersection_point, Point},
};

type Axes = SmallVec<[Point; 12]>;

/// Default intersection-removal budget: worklist iterations allowed per
/// element currently in the store, plus a fixed allowance.
const ITERATIONS_PER_ELEMENT: usize = 64;
const MIN_ITERATIONS: usize = 1 << 12;

/// Splits elements until no two of them cross.
///
/// Elements are checked one at a time against the elements already
/// checked (the `processed` ones). A crossing between two lines splits
/// both at the rounded crossing point; overlapping curves are bisected
/// until they can be told apart. New pieces go back on the worklist
/// unless they are known to be free of crossings.
pub(crate) struct IntersectionRemover<'a> {
    elements: &'a mut ElementStore,
    points: &'a mut Vec<Point>,
    bvh: &'a mut Bvh,
    worklist: Vec<ElementId>,
    splits: usize,
}

impl<'a> IntersectionRemover<'a> {
    pub fn new(
        elements: &'a mut ElementStore,
        points: &'a mut Vec<Point>,
        bvh: &'a mut Bvh,
    ) -> Self {
        IntersectionRemover {
            elements,
            points,
            bvh,
            worklist: Vec::new(),
            splits: 0,
        }
    }

    /// Run the worklist to completion, or until the iteration budget is
    /// spent. Without a fixed `max_iterations`, the budget grows with
    /// the number of elements, splits included.
    pub fn run(mut self, max_iterations: Option<usize>) -> Result<(), SimplifyError> {
        self.bvh.build(self.elements, self.points);
        let root = match self.bvh.root() {
            Some(root) => root,
            None => return Ok(()),
        };

        self.worklist.extend(self.elements.ids());
        let mut iterations = 0;
        while let Some(id) = self.worklist.pop() {
            if self.elements[id].processed {
                continue;
            }
            iterations += 1;
            let limit = max_iterations
                .unwrap_or_else(|| ITERATIONS_PER_ELEMENT * self.elements.len() + MIN_ITERATIONS);
            if iterations > limit {
                return Err(SimplifyError::IterationLimitExceeded { limit });
            }
            let leaf = self.elements[id]
                .bvh_node()
                .expect("element without a bvh leaf");
            if !self.intersect_nodes(leaf, root) {
                self.elements[id].processed = true;
            }
        }

        debug!(
            "remove_intersections: {} splits in {} iterations, {} elements",
            self.splits,
            iterations,
            self.elements.len()
        );
        self.bvh.free();
        Ok(())
    }

    fn leaf_element(&self, node: BvhNodeId) -> ElementId {
        match self.bvh.node(node).kind {
            BvhKind::Leaf(element) => element,
            BvhKind::Split(..) => unreachable!("expected a leaf"),
        }
    }

    fn point(&self, index: u32) -> Point {
        self.points[index as usize]
    }

    /// Check the element at the leaf `element_node` against the
    /// processed elements below `tree_node`. Returns `true` if the
    /// element was split.
    fn intersect_nodes(&mut self, element_node: BvhNodeId, tree_node: BvhNodeId) -> bool {
        let (a, b) = (*self.bvh.node(element_node), *self.bvh.node(tree_node));
        if !a.overlaps(&b) {
            return false;
        }

        let (left, right) = match b.kind {
            BvhKind::Split(left, right) => (left, right),
            BvhKind::Leaf(node_element) => {
                let element = self.leaf_element(element_node);
                debug_assert!(!self.elements[element].processed);
                if !self.elements[node_element].processed
                    || node_element == element
                    || self.equal_elements(element, node_element)
                {
                    return false;
                }

                let e1 = &self.elements[element];
                let e2 = &self.elements[node_element];
                if e1.degree == Degree::Line && e2.degree == Degree::Line {
                    let ixn = intersection_point(
                        self.point(e1.indices[0]),
                        self.point(e1.indices[1]),
                        self.point(e2.indices[0]),
                        self.point(e2.indices[1]),
                    );
                    if !ixn.is_valid() {
                        return false;
                    }
                    self.points.push(ixn.round());
                    let index = self.points.len() as u32 - 1;
                    self.split_line_at(tree_node, index, !ixn.is_accurate());
                    return self.split_line_at(element_node, index, false);
                }

                let mut axes = Axes::new();
                self.append_separating_axes(&mut axes, element);
                self.append_separating_axes(&mut axes, node_element);
                for &axis in axes.iter() {
                    let (min1, max1) = self.axis_range(axis, element);
                    let (min2, max2) = self.axis_range(axis, node_element);
                    if min1 >= max2 || max1 <= min2 {
                        return false;
                    }
                }

                // The hulls overlap: bisect the curves and look again.
                if self.elements[node_element].degree != Degree::Line {
                    self.split_curve(tree_node);
                }
                if self.elements[element].degree != Degree::Line {
                    self.split_curve(element_node);
                    return true;
                }
                match self.bvh.node(tree_node).kind {
                    BvhKind::Split(left, right) => (left, right),
                    BvhKind::Leaf(_) => return false,
                }
            }
        };

        self.intersect_nodes(element_node, left) || self.intersect_nodes(element_node, right)
    }

    /// Checks if two elements have the same points, in the same or in
    /// reversed order.
    fn equal_elements(&self, a: ElementId, b: ElementId) -> bool {
        let (a, b) = (&self.elements[a], &self.elements[b]);
        if a.degree != b.degree {
            return false;
        }
        let pa = a.points().iter().map(|&i| self.point(i));
        let pb = b.points().iter().map(|&i| self.point(i));
        pa.clone().eq(pb.clone()) || pa.eq(pb.rev())
    }

    fn append_separating_axes(&self, axes: &mut Axes, id: ElementId) {
        let e = &self.elements[id];
        let p = |i: usize| self.point(e.indices[i]);
        let mut push = |u: Point, v: Point| {
            let normal = Point::new(u.y - v.y, v.x - u.x);
            if normal != Point::default() {
                axes.push(normal);
            }
        };
        match e.degree {
            Degree::Line => push(p(0), p(1)),
            Degree::Quadratic => {
                push(p(0), p(1));
                push(p(1), p(2));
                push(p(2), p(0));
            }
            Degree::Cubic => {
                push(p(0), p(1));
                push(p(1), p(2));
                push(p(2), p(3));
                push(p(3), p(0));
                push(p(0), p(2));
                push(p(1), p(3));
            }
        }
    }

    /// Projection of the control points of `id` onto `axis`.
    fn axis_range(&self, axis: Point, id: ElementId) -> (i64, i64) {
        let projections = self.elements[id].points().iter().map(|&i| dot(axis, self.point(i)));
        projections.fold((i64::MAX, i64::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)))
    }

    /// Split the line at the leaf `node` at the point `index`. Returns
    /// `false` if the point is one of its end points.
    fn split_line_at(&mut self, node: BvhNodeId, index: u32, process_again: bool) -> bool {
        let element = self.leaf_element(node);
        let (from, to) = (self.elements[element].indices[0], self.elements[element].indices[1]);
        let p = self.point(index);
        if p == self.point(from) || p == self.point(to) {
            return false;
        }
        if process_again {
            self.elements[element].processed = false;
        }

        let (first, second) = self.elements.duplicate(element);
        self.elements[first].set_line(self.points, from, index);
        self.elements[second].set_line(self.points, index, to);
        self.split_node(node, first, second);
        true
    }

    /// Bisect the curve at the leaf `node`.
    fn split_curve(&mut self, node: BvhNodeId) {
        let element = self.leaf_element(node);
        let (first, second) = self.elements.duplicate(element);
        let indices = self.elements[element].indices;
        let degree = self.elements[element].degree;
        let u = self.point(indices[0]);

        let accurate = match degree {
            Degree::Line => unreachable!("lines are split with split_line_at"),
            Degree::Quadratic => {
                let (v, w) = (self.point(indices[1]), self.point(indices[2]));
                let ([c1, mid, c2], mut accurate) = split_quadratic(u, v, w);
                self.points.push(mid);
                let m = self.points.len() as u32 - 1;
                accurate &= self.elements[first].set_quadratic(self.points, indices[0], c1, m);
                accurate &= self.elements[second].set_quadratic(self.points, m, c2, indices[2]);
                accurate
            }
            Degree::Cubic => {
                let (v, w, q) = (
                    self.point(indices[1]),
                    self.point(indices[2]),
                    self.point(indices[3]),
                );
                let ([c1, c2, mid, c3, c4], mut accurate) = split_cubic(u, v, w, q);
                self.points.push(mid);
                let m = self.points.len() as u32 - 1;
                accurate &= self.elements[first].set_cubic(self.points, indices[0], c1, c2, m);
                accurate &= self.elements[second].set_cubic(self.points, m, c3, c4, indices[3]);
                accurate
            }
        };
        if !accurate {
            self.elements[first].processed = false;
            self.elements[second].processed = false;
        }
        self.split_node(node, first, second);
    }

    /// Turn the leaf `node` into a split over the two pieces of its
    /// element, queueing the pieces if they need checking.
    fn split_node(&mut self, node: BvhNodeId, first: ElementId, second: ElementId) {
        let left = self.bvh.new_leaf(self.elements, self.points, first);
        let right = self.bvh.new_leaf(self.elements, self.points, second);
        self.bvh.node_mut(node).kind = BvhKind::Split(left, right);
        self.splits += 1;
        if !self.elements[first].processed {
            self.worklist.push(first);
            self.worklist.push(second);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::fixed::FIXED_POINT_SCALE;

    const S: i32 = FIXED_POINT_SCALE;

    fn lines(segments: &[(Point, Point)]) -> (ElementStore, Vec<Point>) {
        let mut store = ElementStore::default();
        let mut points = vec![];
        for &(a, b) in segments {
            let i = points.len() as u32;
            points.push(a);
            points.push(b);
            store.new_element(Element::new_line(&points, i, i + 1));
        }
        (store, points)
    }

    fn remove(store: &mut ElementStore, points: &mut Vec<Point>) {
        let mut bvh = Bvh::default();
        IntersectionRemover::new(store, points, &mut bvh).run(None).unwrap();
        assert!(store.iter().all(|e| e.processed));
    }

    /// Asserts that no two lines of the store cross at an interior point.
    fn assert_no_crossings(store: &ElementStore, points: &[Point]) {
        let segments: Vec<_> = store
            .iter()
            .filter(|e| e.degree == Degree::Line)
            .map(|e| (points[e.indices[0] as usize], points[e.indices[1] as usize]))
            .collect();
        for (i, &(a, b)) in segments.iter().enumerate() {
            for &(c, d) in &segments[i + 1..] {
                assert!(
                    !intersection_point(a, b, c, d).is_valid(),
                    "{:?}-{:?} crosses {:?}-{:?}",
                    a,
                    b,
                    c,
                    d
                );
            }
        }
    }

    #[test]
    fn test_cross_is_split() {
        let (mut store, mut points) = lines(&[
            (Point::new(0, 0), Point::new(S, S)),
            (Point::new(0, S), Point::new(S, 0)),
        ]);
        remove(&mut store, &mut points);
        assert_eq!(store.len(), 4);
        assert_eq!(points.len(), 5);
        assert_eq!(points[4], Point::new(S / 2, S / 2));
        assert_no_crossings(&store, &points);
    }

    #[test]
    fn test_touching_lines_are_kept() {
        let (mut store, mut points) = lines(&[
            (Point::new(0, 0), Point::new(S, S)),
            (Point::new(S, S), Point::new(2 * S, 0)),
            (Point::new(0, 0), Point::new(S, S)),
        ]);
        remove(&mut store, &mut points);
        assert_eq!(store.len(), 3);
        assert_eq!(points.len(), 6);
    }

    #[test]
    fn test_inexact_crossing_converges() {
        // Crossing at (1/3, 2/3) in grid units.
        let (mut store, mut points) = lines(&[
            (Point::new(0, 0), Point::new(1, 2)),
            (Point::new(0, 1), Point::new(1, 0)),
            (Point::new(-3, -5), Point::new(7, 11)),
        ]);
        remove(&mut store, &mut points);
        assert_no_crossings(&store, &points);
    }

    #[test]
    fn test_random_lines() {
        use crate::random::uniform_line;
        use geo::Rect;
        use rand::{rngs::StdRng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(42);
        let bounds = Rect::new((-100., -100.), (100., 100.));
        let segments: Vec<_> = (0..40)
            .map(|_| {
                let line = uniform_line(&mut rng, bounds);
                (
                    Point::quantize(line.start.x, line.start.y).unwrap(),
                    Point::quantize(line.end.x, line.end.y).unwrap(),
                )
            })
            .collect();
        let (mut store, mut points) = lines(&segments);
        remove(&mut store, &mut points);
        assert!(store.len() > segments.len());
        assert_no_crossings(&store, &points);
    }

    #[test]
    fn test_line_through_curve() {
        let mut points = vec![Point::new(0, 0), Point::new(20 * S, 0)];
        let mut store = ElementStore::default();
        let mut curve = Element::new_line(&points, 0, 1);
        assert!(curve.set_quadratic(&mut points, 0, Point::new(10 * S, 20 * S), 1));
        store.new_element(curve);
        let i = points.len() as u32;
        points.push(Point::new(0, 5 * S));
        points.push(Point::new(20 * S, 5 * S));
        store.new_element(Element::new_line(&points, i, i + 1));

        remove(&mut store, &mut points);
        assert!(store.len() > 2);
        assert!(store.iter().any(|e| e.degree == Degree::Line));
    }

    #[test]
    fn test_iteration_limit() {
        let (mut store, mut points) = lines(&[
            (Point::new(0, 0), Point::new(S, S)),
            (Point::new(0, S), Point::new(S, 0)),
        ]);
        let mut bvh = Bvh::default();
        let result = IntersectionRemover::new(&mut store, &mut points, &mut bvh).run(Some(1));
        assert_eq!(result, Err(SimplifyError::IterationLimitExceeded { limit: 1 }));
    }
}
