use log::{debug, trace};
use smallvec::SmallVec;

use crate::{
    active::{ActiveEdges, EdgeKey},
    element::{Degree, ElementId, ElementStore, NodeLink},
    events::{sort_events, Event, EventType},
    fixed::{point_distance_from_line, Point},
    simplifier::FillRule,
};

/// Nodes bracketing the active elements that touch the sweep point:
/// the last node strictly left of it and the first node strictly right
/// of it.
type Bounds = (Option<EdgeKey>, Option<EdgeKey>);

type Ordered = SmallVec<[ElementId; 8]>;

/// Sweep-line pass linking the elements into closed loops.
///
/// Visits the element end points top to bottom, keeping the elements
/// that cross the sweep line in [`ActiveEdges`]. At every point, the
/// winding numbers of the elements touching it are updated, elements
/// are oriented so that odd regions lie on the same side, and the
/// retained elements meeting there are paired into `next`/`previous`
/// links.
pub(crate) struct Connector<'a> {
    elements: &'a mut ElementStore,
    points: &'a [Point],
    active: &'a mut ActiveEdges,
    events: &'a mut Vec<Event>,
    fill_rule: FillRule,
}

impl<'a> Connector<'a> {
    pub fn new(
        elements: &'a mut ElementStore,
        points: &'a [Point],
        active: &'a mut ActiveEdges,
        events: &'a mut Vec<Event>,
        fill_rule: FillRule,
    ) -> Self {
        Connector {
            elements,
            points,
            active,
            events,
            fill_rule,
        }
    }

    #[inline]
    fn point(&self, index: u32) -> Point {
        self.points[index as usize]
    }

    pub fn run(mut self) {
        self.active.clear();
        self.events.clear();
        self.events.reserve(2 * self.elements.len());
        for id in self.elements.ids() {
            let e = &mut self.elements[id];
            e.next = None;
            e.previous = None;
            e.winding = 0;
            e.node = NodeLink::None;

            let u = self.points[e.first_index() as usize];
            let v = self.points[e.last_index() as usize];
            if u == v {
                continue;
            }
            e.pointing_up = v < u;
            e.originally_pointing_up = e.pointing_up;
            self.events.push(Event {
                point: u.min(v),
                ty: EventType::Upper,
                element: id,
            });
            self.events.push(Event {
                point: u.max(v),
                ty: EventType::Lower,
                element: id,
            });
        }
        sort_events(self.events);
        debug!("connect_elements: {} events", self.events.len());

        let mut ordered = Ordered::new();
        while let Some(&event) = self.events.last() {
            let point = event.point;
            let bounds = self.outer_bounds(point);
            trace!(
                "connect_elements: point {:?}, bounds {:?}, {} active",
                point,
                bounds,
                self.active.len()
            );

            if self.continue_element(event, bounds) {
                continue;
            }

            ordered.clear();
            self.split_passing(event, bounds, &mut ordered);

            while let Some(&event) = self.events.last() {
                if event.point != point {
                    break;
                }
                self.events.pop();
                match event.ty {
                    EventType::Upper => {
                        let left = self.find_element_left_of(event.element, bounds);
                        let key = self.active.insert_after(left, event.element);
                        self.elements[event.element].node = NodeLink::Edge(key);
                    }
                    EventType::Lower => {
                        let key = self.elements[event.element]
                            .edge_node()
                            .expect("lower event of an inactive element");
                        self.active.remove(key);
                        self.elements[event.element].node = NodeLink::None;
                    }
                }
            }

            self.update_winding(bounds);

            // Elements starting here, right to left.
            let mut current = match bounds.1 {
                Some(key) => self.active.previous(key),
                None => self.active.back(),
            };
            while let Some(key) = current {
                if Some(key) == bounds.0 {
                    break;
                }
                let id = self.active.element(key);
                if self.retains(id) {
                    ordered.push(id);
                }
                current = self.active.previous(key);
            }

            self.pair(point, &mut ordered);
        }

        debug_assert!(self.active.is_empty());
        debug_assert!(check_links(self.elements, self.points));
        debug!(
            "connect_elements: {} of {} elements linked",
            self.elements.iter().filter(|e| e.next.is_some()).count(),
            self.elements.len()
        );
    }

    fn retains(&self, id: ElementId) -> bool {
        let e = &self.elements[id];
        self.fill_rule.retains(e.winding + e.originally_pointing_up as i32)
    }

    fn link(&mut self, previous: ElementId, next: ElementId) {
        debug_assert!(self.elements[previous].next.is_none());
        debug_assert!(self.elements[next].previous.is_none());
        self.elements[previous].next = Some(next);
        self.elements[next].previous = Some(previous);
    }

    /// First node of the range between `bounds`.
    fn range_start(&self, bounds: Bounds) -> Option<EdgeKey> {
        match bounds.0 {
            Some(key) => self.active.next(key),
            None => self.active.front(),
        }
    }

    /// Handle the common case of a single element ending at the point
    /// and a single one starting there, with nothing else touching it.
    /// The new element takes over the node of the old one.
    fn continue_element(&mut self, event: Event, bounds: Bounds) -> bool {
        let n = self.events.len();
        if event.ty != EventType::Lower || n < 2 {
            return false;
        }
        let upper = self.events[n - 2];
        if upper.ty != EventType::Upper || upper.point != event.point {
            return false;
        }
        if n > 2 && self.events[n - 3].point == event.point {
            return false;
        }
        let node = match self.elements[event.element].edge_node() {
            Some(node) => node,
            None => return false,
        };
        if self.range_start(bounds) != Some(node) || self.active.next(node) != bounds.1 {
            return false;
        }

        let (element, next) = (event.element, upper.element);
        self.events.truncate(n - 2);
        self.active.set_element(node, next);
        self.elements[next].node = NodeLink::Edge(node);
        self.elements[element].node = NodeLink::None;

        if self.elements[next].pointing_up != self.elements[element].pointing_up {
            self.elements[next].flip();
        }
        self.elements[next].winding = self.elements[element].winding;
        if self.retains(element) {
            if self.elements[element].pointing_up {
                self.link(next, element);
            } else {
                self.link(element, next);
            }
        }
        true
    }

    /// Collect the elements ending at the event point, and split the
    /// ones passing through it.
    fn split_passing(&mut self, event: Event, bounds: Bounds, ordered: &mut Ordered) {
        let index = {
            let e = &self.elements[event.element];
            match event.ty {
                EventType::Upper => e.upper_index(),
                EventType::Lower => e.lower_index(),
            }
        };
        debug_assert_eq!(self.point(index), event.point);

        let mut current = self.range_start(bounds);
        while current != bounds.1 {
            let key = current.expect("range ends at its upper bound");
            current = self.active.next(key);
            let id = self.active.element(key);

            if self.point(self.elements[id].lower_index()) == event.point {
                if self.retains(id) {
                    ordered.push(id);
                }
                continue;
            }

            // Only lines can pass through the end point of another
            // element once intersections are removed.
            debug_assert_eq!(self.elements[id].degree, Degree::Line);
            debug_assert_ne!(self.point(self.elements[id].upper_index()), event.point);
            let (element, upper) = self.elements.duplicate(id);
            self.elements[upper].set_lower_index(index);
            self.elements[upper].node = NodeLink::None;
            self.elements[element].set_upper_index(index);
            self.elements[element].next = None;
            self.elements[element].previous = None;

            if let Some(next) = self.elements[upper].next {
                self.elements[next].previous = Some(upper);
            } else if let Some(previous) = self.elements[upper].previous {
                self.elements[previous].next = Some(upper);
            }
            let e = &mut self.elements[element];
            if e.pointing_up != e.originally_pointing_up {
                e.flip();
            }
            if self.retains(upper) {
                ordered.push(upper);
            }
        }
    }

    /// Recompute the winding numbers of the elements between `bounds`
    /// and orient them.
    fn update_winding(&mut self, bounds: Bounds) {
        let mut winding = match bounds.0 {
            Some(key) => self.elements[self.active.element(key)].winding,
            None => 0,
        };
        let mut current = self.range_start(bounds);
        while current != bounds.1 {
            let key = current.expect("range ends at its upper bound");
            current = self.active.next(key);
            let id = self.active.element(key);
            let e = &mut self.elements[id];
            debug_assert_eq!(e.pointing_up, e.originally_pointing_up);

            let mut ccw = winding & 1;
            if e.originally_pointing_up {
                winding -= 1;
            } else {
                winding += 1;
                ccw ^= 1;
            }
            e.winding = winding;
            if ccw == 0 {
                e.flip();
            }
        }
    }

    /// Link the retained elements around `point`, in circular order.
    fn pair(&mut self, point: Point, ordered: &mut Ordered) {
        if ordered.is_empty() {
            return;
        }
        debug_assert_eq!(ordered.len() % 2, 0);
        let first = ordered[0];
        let mut i = 0;
        if self.point(self.elements[first].first_index()) != point {
            ordered.push(first);
            i = 1;
        }
        while i + 1 < ordered.len() {
            let (next, previous) = (ordered[i], ordered[i + 1]);
            self.link(previous, next);
            i += 2;
        }
    }

    /// Find the nodes bracketing the elements that touch `point`.
    fn outer_bounds(&self, point: Point) -> Bounds {
        let mut bounds: Bounds = (None, None);
        let mut current = self.active.root();
        while let Some(key) = current {
            let e = &self.elements[self.active.element(key)];
            let v1 = self.point(e.lower_index());
            let v2 = self.point(e.upper_index());
            if point == v1 || point == v2 {
                break;
            }
            let mut d = point_distance_from_line(point, v1, v2);
            if d == 0 {
                if e.degree == Degree::Line {
                    break;
                }
                // On the chord of a curve: the side of the bulge decides.
                d = -point_distance_from_line(self.point(e.indices[1]), v1, v2);
                if d == 0 && e.degree == Degree::Cubic {
                    d = -point_distance_from_line(self.point(e.indices[2]), v1, v2);
                }
                debug_assert_ne!(d, 0);
            }
            if d < 0 {
                bounds.1 = Some(key);
                current = self.active.left(key);
            } else {
                bounds.0 = Some(key);
                current = self.active.right(key);
            }
        }

        let mid = match current {
            Some(mid) => mid,
            None => return bounds,
        };

        let mut current = self.active.left(mid);
        while let Some(key) = current {
            if self.touches(key, point) {
                current = self.active.left(key);
            } else {
                bounds.0 = Some(key);
                current = self.active.right(key);
            }
        }

        let mut current = self.active.right(mid);
        while let Some(key) = current {
            if self.touches(key, point) {
                current = self.active.right(key);
            } else {
                bounds.1 = Some(key);
                current = self.active.left(key);
            }
        }
        bounds
    }

    fn touches(&self, key: EdgeKey, point: Point) -> bool {
        let e = &self.elements[self.active.element(key)];
        let v1 = self.point(e.lower_index());
        let v2 = self.point(e.upper_index());
        point == v1
            || point == v2
            || (e.degree == Degree::Line && point_distance_from_line(point, v1, v2) == 0)
    }

    /// The node after which `element` should be inserted, or `None` to
    /// insert it at the front.
    fn find_element_left_of(&self, element: ElementId, bounds: Bounds) -> Option<EdgeKey> {
        let mut current = bounds.0.or_else(|| self.active.front());
        let mut result = None;
        while let Some(key) = current {
            if Some(key) == bounds.1 || self.element_is_left_of(element, self.active.element(key)) {
                break;
            }
            result = Some(key);
            current = self.active.next(key);
        }
        result
    }

    /// Checks if `left` lies left of `right` on the sweep line. The two
    /// elements must overlap vertically.
    fn element_is_left_of(&self, left: ElementId, right: ElementId) -> bool {
        let (l, r) = (&self.elements[left], &self.elements[right]);
        let left_u = self.point(l.upper_index());
        let left_l = self.point(l.lower_index());
        let right_u = self.point(r.upper_index());
        let right_l = self.point(r.lower_index());
        debug_assert!(left_l >= right_u && right_l >= left_u);

        if left_u.x < right_l.x.min(right_u.x) {
            return true;
        }
        if left_u.x > right_l.x.max(right_u.x) {
            return false;
        }
        let mut d = point_distance_from_line(left_u, right_l, right_u);
        if d == 0 {
            d = point_distance_from_line(left_l, right_l, right_u);
            if d == 0 {
                if r.degree != Degree::Line {
                    d = point_distance_from_line(left_l, right_l, self.point(r.indices[1]));
                    if d == 0 {
                        d = point_distance_from_line(left_l, right_l, self.point(r.indices[2]));
                    }
                } else if l.degree != Degree::Line {
                    d = point_distance_from_line(self.point(l.indices[1]), right_l, right_u);
                    if d == 0 {
                        d = point_distance_from_line(self.point(l.indices[2]), right_l, right_u);
                    }
                }
            }
        }
        d < 0
    }
}

/// Checks that the loop links are consistent: `next` and `previous` are
/// set together, point at each other, and consecutive elements share
/// their end point.
pub(crate) fn check_links(elements: &ElementStore, points: &[Point]) -> bool {
    elements.ids().all(|id| {
        let e = &elements[id];
        match (e.next, e.previous) {
            (None, None) => true,
            (Some(next), Some(previous)) => {
                elements[next].previous == Some(id)
                    && elements[previous].next == Some(id)
                    && points[elements[next].first_index() as usize]
                        == points[e.last_index() as usize]
            }
            _ => false,
        }
    })
}
