use std::ops::{Index, IndexMut};

use crate::{
    active::EdgeKey,
    bezier::{flatten_cubic, flatten_quadratic},
    bvh::BvhNodeId,
    fixed::Point,
};

/// Index of an [`Element`] in the [`ElementStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

/// Degree of the Bézier curve described by an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Degree {
    Line = 1,
    Quadratic = 2,
    Cubic = 3,
}

impl Degree {
    #[inline]
    pub fn as_usize(self) -> usize {
        self as usize
    }
}

/// Back-reference from an element to the node that currently indexes it.
///
/// Elements are referenced by BVH leaves while intersections are
/// removed, and by active-edge nodes during the sweep; never by both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLink {
    None,
    Bvh(BvhNodeId),
    Edge(EdgeKey),
}

/// A line, quadratic or cubic segment of the path.
///
/// The points are referenced by index into the shared point buffer.
/// The fields from `next` onwards are only meaningful while elements
/// are connected into polygons.
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) indices: [u32; 4],
    pub(crate) degree: Degree,
    /// Mean of the defining points; used to partition the BVH.
    pub(crate) middle: Point,
    /// Set once the element has been checked against all processed
    /// elements for intersections.
    pub(crate) processed: bool,

    pub(crate) next: Option<ElementId>,
    pub(crate) previous: Option<ElementId>,
    /// Winding number to the right of the element.
    pub(crate) winding: i32,
    pub(crate) pointing_up: bool,
    pub(crate) originally_pointing_up: bool,
    pub(crate) node: NodeLink,
}

impl Element {
    /// A line from the point at index `from` to the point at `to`.
    pub(crate) fn new_line(points: &[Point], from: u32, to: u32) -> Self {
        let mut element = Element {
            indices: [from, to, 0, 0],
            degree: Degree::Line,
            middle: Point::default(),
            processed: false,
            next: None,
            previous: None,
            winding: 0,
            pointing_up: false,
            originally_pointing_up: false,
            node: NodeLink::None,
        };
        element.set_line(points, from, to);
        element
    }

    pub(crate) fn set_line(&mut self, points: &[Point], from: u32, to: u32) {
        let (u, v) = (points[from as usize], points[to as usize]);
        self.degree = Degree::Line;
        self.indices[0] = from;
        self.indices[1] = to;
        self.middle = (u + v).shr(1);
    }

    /// Make this a quadratic through a new control point, or a line if
    /// the curve is flat. Returns `false` if it became a line.
    pub(crate) fn set_quadratic(
        &mut self,
        points: &mut Vec<Point>,
        from: u32,
        ctrl: Point,
        to: u32,
    ) -> bool {
        let (u, w) = (points[from as usize], points[to as usize]);
        if flatten_quadratic(u, ctrl, w) {
            self.set_line(points, from, to);
            return false;
        }
        self.degree = Degree::Quadratic;
        self.indices = [from, points.len() as u32, to, 0];
        self.middle = Point::new((u.x + ctrl.x + w.x) / 3, (u.y + ctrl.y + w.y) / 3);
        points.push(ctrl);
        true
    }

    /// Make this a cubic through two new control points, or a line if
    /// the curve is flat. Returns `false` if it became a line.
    pub(crate) fn set_cubic(
        &mut self,
        points: &mut Vec<Point>,
        from: u32,
        v: Point,
        w: Point,
        to: u32,
    ) -> bool {
        let (u, q) = (points[from as usize], points[to as usize]);
        if flatten_cubic(u, v, w, q) {
            self.set_line(points, from, to);
            return false;
        }
        let first_ctrl = points.len() as u32;
        self.degree = Degree::Cubic;
        self.indices = [from, first_ctrl, first_ctrl + 1, to];
        self.middle = (u + v + w + q).shr(2);
        points.push(v);
        points.push(w);
        true
    }

    /// Indices of the defining points, first to last.
    #[inline]
    pub fn points(&self) -> &[u32] {
        &self.indices[..=self.degree.as_usize()]
    }

    #[inline]
    pub fn first_index(&self) -> u32 {
        self.indices[0]
    }

    #[inline]
    pub fn last_index(&self) -> u32 {
        self.indices[self.degree.as_usize()]
    }

    /// Index of the end point that comes first in sweep order.
    #[inline]
    pub fn upper_index(&self) -> u32 {
        self.indices[if self.pointing_up {
            self.degree.as_usize()
        } else {
            0
        }]
    }

    /// Index of the end point that comes last in sweep order.
    #[inline]
    pub fn lower_index(&self) -> u32 {
        self.indices[if self.pointing_up {
            0
        } else {
            self.degree.as_usize()
        }]
    }

    #[inline]
    pub(crate) fn set_upper_index(&mut self, index: u32) {
        let i = if self.pointing_up {
            self.degree.as_usize()
        } else {
            0
        };
        self.indices[i] = index;
    }

    #[inline]
    pub(crate) fn set_lower_index(&mut self, index: u32) {
        let i = if self.pointing_up {
            0
        } else {
            self.degree.as_usize()
        };
        self.indices[i] = index;
    }

    /// Reverse the direction of the element, keeping its geometry.
    pub(crate) fn flip(&mut self) {
        debug_assert!(self.next.is_none() && self.previous.is_none());
        self.indices[..=self.degree.as_usize()].reverse();
        self.pointing_up = !self.pointing_up;
    }

    #[inline]
    pub(crate) fn bvh_node(&self) -> Option<BvhNodeId> {
        match self.node {
            NodeLink::Bvh(id) => Some(id),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn edge_node(&self) -> Option<EdgeKey> {
        match self.node {
            NodeLink::Edge(key) => Some(key),
            _ => None,
        }
    }
}

/// Arena owning every element of one simplification run.
///
/// Elements are never freed individually; the whole store is cleared
/// between runs.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: Vec<Element>,
}

impl ElementStore {
    /// Reserve room for `count` more elements.
    pub fn allocate(&mut self, count: usize) {
        self.elements.reserve(count);
    }

    pub fn new_element(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(element);
        id
    }

    /// Copy the element at `id` into a new slot.
    ///
    /// Returns the original and the copy; splitting code then shrinks
    /// the original to the first part and the copy to the second.
    pub fn duplicate(&mut self, id: ElementId) -> (ElementId, ElementId) {
        let copy = self.elements[id.0].clone();
        (id, self.new_element(copy))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> {
        (0..self.elements.len()).map(ElementId)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

impl Index<ElementId> for ElementStore {
    type Output = Element;

    #[inline]
    fn index(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }
}

impl IndexMut<ElementId> for ElementStore {
    #[inline]
    fn index_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }
}
