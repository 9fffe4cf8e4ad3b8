use log::trace;

use crate::{
    element::{ElementId, ElementStore, NodeLink},
    fixed::Point,
};

/// Index of a node in the [`Bvh`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BvhNodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvhKind {
    Leaf(ElementId),
    Split(BvhNodeId, BvhNodeId),
}

/// A node of the hierarchy with its axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
pub struct BvhNode {
    pub kind: BvhKind,
    pub minimum: Point,
    pub maximum: Point,
}

impl BvhNode {
    /// Strict overlap test: boxes that only touch do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &BvhNode) -> bool {
        self.minimum.x < other.maximum.x
            && self.minimum.y < other.maximum.y
            && self.maximum.x > other.minimum.x
            && self.maximum.y > other.minimum.y
    }
}

/// Bounding box of a set of points.
pub(crate) fn bounds_of<I: IntoIterator<Item = Point>>(points: I) -> (Point, Point) {
    let mut minimum = Point::new(i32::MAX, i32::MAX);
    let mut maximum = Point::new(i32::MIN, i32::MIN);
    for p in points {
        minimum.x = minimum.x.min(p.x);
        minimum.y = minimum.y.min(p.y);
        maximum.x = maximum.x.max(p.x);
        maximum.y = maximum.y.max(p.y);
    }
    (minimum, maximum)
}

/// Bounding volume hierarchy over the elements.
///
/// The nodes live in an arena that is dropped as a whole once the
/// intersections are removed. Leaves may later be turned into split
/// nodes when their element gets split.
#[derive(Debug, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    root: Option<BvhNodeId>,
}

impl Bvh {
    /// Reserve room for `count` nodes.
    pub fn allocate(&mut self, count: usize) {
        self.nodes.reserve(count);
    }

    pub fn free(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub fn root(&self) -> Option<BvhNodeId> {
        self.root
    }

    pub fn new_node(&mut self, node: BvhNode) -> BvhNodeId {
        let id = BvhNodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Create a leaf for `element`, linking the element back to it.
    pub fn new_leaf(
        &mut self,
        elements: &mut ElementStore,
        points: &[Point],
        element: ElementId,
    ) -> BvhNodeId {
        let (minimum, maximum) =
            bounds_of(elements[element].points().iter().map(|&i| points[i as usize]));
        let id = self.new_node(BvhNode {
            kind: BvhKind::Leaf(element),
            minimum,
            maximum,
        });
        elements[element].node = NodeLink::Bvh(id);
        id
    }

    #[inline]
    pub fn node(&self, id: BvhNodeId) -> &BvhNode {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn node_mut(&mut self, id: BvhNodeId) -> &mut BvhNode {
        &mut self.nodes[id.0]
    }

    /// Build the hierarchy over all elements of the store.
    pub fn build(&mut self, elements: &mut ElementStore, points: &[Point]) {
        self.free();
        let mut ids: Vec<ElementId> = elements.ids().collect();
        if ids.is_empty() {
            return;
        }
        self.allocate(2 * ids.len());
        let root = self.build_tree(elements, points, &mut ids);
        self.root = Some(root);
        trace!("bvh: built {} nodes over {} elements", self.nodes.len(), ids.len());
    }

    /// Build a subtree over `ids`, which is reordered in place.
    ///
    /// Splits along the axis where the element midpoints spread the
    /// most, around the middle of that spread. This is not a median
    /// split, so the tree may be unbalanced for clustered input.
    pub fn build_tree(
        &mut self,
        elements: &mut ElementStore,
        points: &[Point],
        ids: &mut [ElementId],
    ) -> BvhNodeId {
        debug_assert!(!ids.is_empty());
        if ids.len() == 1 {
            return self.new_leaf(elements, points, ids[0]);
        }

        let (minimum, maximum) = bounds_of(ids.iter().map(|&id| elements[id].middle));
        let along_x = maximum.x - minimum.x > maximum.y - minimum.y;
        let coord = |p: Point| if along_x { p.x } else { p.y };
        let pivot = (coord(maximum) + coord(minimum)) >> 1;

        let mut lo = 0;
        let mut hi = ids.len() - 1;
        while lo < hi {
            while lo < hi && coord(elements[ids[lo]].middle) <= pivot {
                lo += 1;
            }
            while lo < hi && coord(elements[ids[hi]].middle) > pivot {
                hi -= 1;
            }
            if lo < hi {
                ids.swap(lo, hi);
            }
        }
        if coord(elements[ids[lo]].middle) <= pivot {
            lo += 1;
        }
        if lo == ids.len() {
            // All midpoints are the same.
            debug_assert_eq!(minimum, maximum);
            lo = ids.len() >> 1;
        }

        let (left_ids, right_ids) = ids.split_at_mut(lo);
        let left = self.build_tree(elements, points, left_ids);
        let right = self.build_tree(elements, points, right_ids);
        let (l, r) = (self.nodes[left.0], self.nodes[right.0]);
        self.new_node(BvhNode {
            kind: BvhKind::Split(left, right),
            minimum: Point::new(l.minimum.x.min(r.minimum.x), l.minimum.y.min(r.minimum.y)),
            maximum: Point::new(l.maximum.x.max(r.maximum.x), l.maximum.y.max(r.maximum.y)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn line_store(lines: &[(Point, Point)]) -> (ElementStore, Vec<Point>) {
        let mut store = ElementStore::default();
        let mut points = vec![];
        for &(a, b) in lines {
            let i = points.len() as u32;
            points.push(a);
            points.push(b);
            store.new_element(Element::new_line(&points, i, i + 1));
        }
        (store, points)
    }

    fn leaves(bvh: &Bvh, id: BvhNodeId, out: &mut Vec<ElementId>) {
        let node = bvh.node(id);
        match node.kind {
            BvhKind::Leaf(e) => out.push(e),
            BvhKind::Split(l, r) => {
                for child in [l, r].iter() {
                    let c = bvh.node(*child);
                    assert!(node.minimum.x <= c.minimum.x && node.maximum.x >= c.maximum.x);
                    assert!(node.minimum.y <= c.minimum.y && node.maximum.y >= c.maximum.y);
                    leaves(bvh, *child, out);
                }
            }
        }
    }

    #[test]
    fn test_build_covers_all_elements() {
        let lines: Vec<_> = (0..37)
            .map(|i| (Point::new(i * 10, (i * 7) % 13), Point::new(i * 10 + 5, 100 - i)))
            .collect();
        let (mut store, points) = line_store(&lines);
        let mut bvh = Bvh::default();
        bvh.build(&mut store, &points);

        let mut found = vec![];
        leaves(&bvh, bvh.root().unwrap(), &mut found);
        found.sort();
        assert_eq!(found, store.ids().collect::<Vec<_>>());

        for id in store.ids() {
            let leaf = store[id].bvh_node().unwrap();
            assert_eq!(bvh.node(leaf).kind, BvhKind::Leaf(id));
        }
    }

    #[test]
    fn test_build_identical_midpoints() {
        let line = (Point::new(0, 0), Point::new(10, 10));
        let (mut store, points) = line_store(&[line; 5]);
        let mut bvh = Bvh::default();
        bvh.build(&mut store, &points);
        let mut found = vec![];
        leaves(&bvh, bvh.root().unwrap(), &mut found);
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn test_strict_overlap() {
        let a = BvhNode {
            kind: BvhKind::Leaf(ElementId(0)),
            minimum: Point::new(0, 0),
            maximum: Point::new(10, 10),
        };
        let mut b = a;
        b.minimum = Point::new(10, 0);
        b.maximum = Point::new(20, 10);
        assert!(!a.overlaps(&b));
        b.minimum.x = 9;
        assert!(a.overlaps(&b));
    }
}
