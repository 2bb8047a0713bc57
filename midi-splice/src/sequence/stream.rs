use std::ops::Deref;

use crate::{events::Event, num::MIDINum};

use super::event::Delta;

/// A single flattened track: an ordered list of delta-timed events.
///
/// Absolute times are never stored. They are derived on demand by summing deltas, so splicing
/// events in and out of a stream cannot make them drift.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream<D: MIDINum = u64> {
    events: Vec<Delta<D, Event>>,
}

impl<D: MIDINum> Default for Stream<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: MIDINum> Stream<D> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn from_events(events: Vec<Delta<D, Event>>) -> Self {
        Self { events }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: Delta<D, Event>) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Delta<D, Event>] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Delta<D, Event>> {
        self.events
    }

    /// Number of events in the header block.
    pub fn header_len(&self) -> usize {
        self.events
            .iter()
            .take_while(|e| e.is_header_meta())
            .count()
    }

    /// The leading run of meta events before the first note or control event.
    ///
    /// An end-of-track marker ends the header block and is not part of it.
    pub fn header_block(&self) -> &[Delta<D, Event>] {
        &self.events[..self.header_len()]
    }

    /// Absolute time of the last event (the sum of all deltas).
    pub fn total_ticks(&self) -> D {
        let mut total = D::zero();
        for e in self.events.iter() {
            total += e.delta;
        }
        total
    }

    /// Iterates the events together with their absolute time.
    pub fn iter_timed(&self) -> impl Iterator<Item = (D, &Delta<D, Event>)> + '_ {
        let mut time = D::zero();
        self.events.iter().map(move |e| {
            time += e.delta;
            (time, e)
        })
    }

    /// The absolute time of every event, in order.
    pub fn absolute_times(&self) -> Vec<D> {
        self.iter_timed().map(|(time, _)| time).collect()
    }

    pub fn ends_with_end_of_track(&self) -> bool {
        self.events
            .last()
            .map(|e| e.is_end_of_track())
            .unwrap_or(false)
    }
}

impl<D: MIDINum> Deref for Stream<D> {
    type Target = [Delta<D, Event>];

    fn deref(&self) -> &Self::Target {
        &self.events
    }
}

impl<D: MIDINum> FromIterator<Delta<D, Event>> for Stream<D> {
    fn from_iter<T: IntoIterator<Item = Delta<D, Event>>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl<D: MIDINum> IntoIterator for Stream<D> {
    type Item = Delta<D, Event>;
    type IntoIter = std::vec::IntoIter<Delta<D, Event>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a, D: MIDINum> IntoIterator for &'a Stream<D> {
    type Item = &'a Delta<D, Event>;
    type IntoIter = std::slice::Iter<'a, Delta<D, Event>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl<D: MIDINum> From<Vec<Delta<D, Event>>> for Stream<D> {
    fn from(events: Vec<Delta<D, Event>>) -> Self {
        Self::from_events(events)
    }
}
