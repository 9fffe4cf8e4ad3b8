use std::cmp::Ordering;

use itertools::{Itertools, MinMaxResult};

use crate::{element::ElementId, fixed::Point};

/// A sweep event: an element starts or ends at `point`.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub point: Point,
    pub ty: EventType,
    pub element: ElementId,
}

/// Event type to associate with event.
///
/// At a given point, upper events order before lower events. The sweep
/// consumes events from the back of the sorted list, so all elements
/// ending at a point are removed before the ones starting there are
/// inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventType {
    Upper,
    Lower,
}

/// Equality check consistent with the ordering. Note that it ignores
/// the element.
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point && self.ty == other.ty
    }
}

impl Eq for Event {}

/// Ordering for a list that is consumed from the back: later sweep
/// points come first.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.point == other.point {
            self.ty.cmp(&other.ty)
        } else {
            other.point.cmp(&self.point)
        }
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort events by their [`Ord`].
///
/// Distributes the events into buckets over the `y` range, then
/// finishes with an insertion sort, which is cheap as the events are
/// nearly sorted by then. The sort is stable.
pub fn sort_events(events: &mut Vec<Event>) {
    let count = events.len();
    let (minimum, maximum) = match events.iter().map(|e| e.point.y).minmax() {
        MinMaxResult::NoElements => return,
        MinMaxResult::OneElement(y) => (y, y),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };

    // Larger y goes into earlier buckets.
    let span = i64::from(maximum) - i64::from(minimum) + 1;
    let bucket = |e: &Event| {
        let index = (i64::from(e.point.y) - i64::from(minimum)) * (count as i64 - 1) / span;
        count - 1 - index as usize
    };
    let mut starts = vec![0; count + 1];
    for e in events.iter() {
        starts[bucket(e) + 1] += 1;
    }
    for i in 1..=count {
        starts[i] += starts[i - 1];
    }
    let mut sorted = events.clone();
    for e in events.iter() {
        let b = bucket(e);
        sorted[starts[b]] = *e;
        starts[b] += 1;
    }

    for i in 1..count {
        let e = sorted[i];
        let mut j = i;
        while j > 0 && e < sorted[j - 1] {
            sorted[j] = sorted[j - 1];
            j -= 1;
        }
        sorted[j] = e;
    }
    *events = sorted;
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn event(x: i32, y: i32, ty: EventType, element: usize) -> Event {
        Event {
            point: Point::new(x, y),
            ty,
            element: ElementId(element),
        }
    }

    #[test]
    fn test_event_ordering() {
        let e1 = event(0, 0, EventType::Upper, 0);
        let e2 = event(1, 0, EventType::Upper, 1);
        let e3 = event(1, 0, EventType::Lower, 2);
        let e4 = event(0, 1, EventType::Upper, 3);

        let mut events = vec![e1, e3, e4, e2];
        sort_events(&mut events);

        let order: Vec<_> = std::iter::from_fn(|| events.pop()).map(|e| e.element.0).collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_sort_matches_std() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let n = rng.gen_range(1..200);
            let mut events: Vec<_> = (0..n)
                .map(|i| {
                    let ty = if rng.gen() { EventType::Upper } else { EventType::Lower };
                    event(rng.gen_range(-5..5), rng.gen_range(-1000..1000), ty, i)
                })
                .collect();
            let mut expected = events.clone();
            expected.sort();
            sort_events(&mut events);
            let keys = |v: &[Event]| {
                v.iter()
                    .map(|e| (e.point, e.ty, e.element))
                    .collect::<Vec<_>>()
            };
            assert_eq!(keys(&events), keys(&expected));
        }
    }
}
