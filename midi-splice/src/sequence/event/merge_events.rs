use tracing::debug;

use crate::{
    events::{Event, MIDIDelta},
    num::MIDINum,
    sequence::{collect_infallible, wrap_infallible, Stream},
};

use super::{filter_events, Delta};

struct SeqTime<D: MIDINum, E, I> {
    iter: I,
    time: D,
    next: Option<E>,
}

impl<D, E, Err, I> SeqTime<D, E, I>
where
    D: MIDINum,
    E: MIDIDelta<D>,
    I: Iterator<Item = Result<E, Err>>,
{
    fn new(iter: I) -> Self {
        Self {
            iter,
            time: D::zero(),
            next: None,
        }
    }

    fn move_next(&mut self) -> Result<(), Err> {
        self.next = match self.iter.next() {
            None => None,
            Some(Err(e)) => return Err(e),
            Some(Ok(e)) => {
                self.time += e.delta();
                Some(e)
            }
        };
        Ok(())
    }
}

/// Iterator returned by [`merge_events`].
pub struct MergeEvents<D: MIDINum, E, Err, I1, I2> {
    primary: SeqTime<D, E, I1>,
    secondary: SeqTime<D, E, I2>,
    time: D,
    started: bool,
    ended: bool,
    pending_error: Option<Err>,
}

impl<D, E, Err, I1, I2> MergeEvents<D, E, Err, I1, I2>
where
    D: MIDINum,
    E: MIDIDelta<D>,
    I1: Iterator<Item = Result<E, Err>>,
    I2: Iterator<Item = Result<E, Err>>,
{
    fn start(&mut self) -> Result<(), Err> {
        self.started = true;
        self.primary.move_next()?;
        self.secondary.move_next()
    }
}

impl<D, E, Err, I1, I2> Iterator for MergeEvents<D, E, Err, I1, I2>
where
    D: MIDINum,
    E: MIDIDelta<D>,
    I1: Iterator<Item = Result<E, Err>>,
    I2: Iterator<Item = Result<E, Err>>,
{
    type Item = Result<E, Err>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending_error.take() {
            self.ended = true;
            return Some(Err(e));
        }
        if self.ended {
            return None;
        }
        if !self.started {
            if let Err(e) = self.start() {
                self.ended = true;
                return Some(Err(e));
            }
        }

        let take_primary = match (&self.primary.next, &self.secondary.next) {
            (None, None) => {
                self.ended = true;
                return None;
            }
            (Some(_), None) => true,
            (None, Some(_)) => false,
            // Ties go to the primary sequence.
            (Some(_), Some(_)) => self.primary.time <= self.secondary.time,
        };

        let (event, time, advanced) = if take_primary {
            let event = self.primary.next.take();
            let time = self.primary.time;
            (event, time, self.primary.move_next())
        } else {
            let event = self.secondary.next.take();
            let time = self.secondary.time;
            (event, time, self.secondary.move_next())
        };

        if let Err(e) = advanced {
            self.pending_error = Some(e);
        }

        let mut event = event?;
        event.set_delta(time.gap_since(self.time));
        self.time = time;
        Some(Ok(event))
    }
}

/// Merge a pair of event iterators into one time-ordered iterator.
///
/// Events are ordered by absolute time; when both sequences have an event at the same time the
/// event from `primary` comes first. Deltas are re-encoded against the merged order.
///
/// ## Example
///```
/// use midi_splice::{
///     events::Event,
///     sequence::{event::merge_events, to_vec_result, wrap_ok},
/// };
///
/// let drums = vec![
///     Event::new_delta_note_on_event(0u64, 9, 36, 100),
///     Event::new_delta_note_off_event(100, 9, 36),
/// ];
/// let fill = vec![
///     Event::new_delta_note_on_event(50u64, 9, 38, 100),
///     Event::new_delta_note_off_event(100, 9, 38),
/// ];
///
/// let merged: Vec<_> =
///     to_vec_result(merge_events(wrap_ok(drums.into_iter()), wrap_ok(fill.into_iter()))).unwrap();
///
/// assert_eq!(
///     merged,
///     vec![
///         Event::new_delta_note_on_event(0u64, 9, 36, 100),
///         Event::new_delta_note_on_event(50, 9, 38, 100),
///         Event::new_delta_note_off_event(50, 9, 36),
///         Event::new_delta_note_off_event(50, 9, 38),
///     ]
/// )
///```
pub fn merge_events<D, E, Err, I1, I2>(primary: I1, secondary: I2) -> MergeEvents<D, E, Err, I1, I2>
where
    D: MIDINum,
    E: MIDIDelta<D>,
    I1: Iterator<Item = Result<E, Err>>,
    I2: Iterator<Item = Result<E, Err>>,
{
    MergeEvents {
        primary: SeqTime::new(primary),
        secondary: SeqTime::new(secondary),
        time: D::zero(),
        started: false,
        ended: false,
        pending_error: None,
    }
}

/// Merge two streams, keeping every event of `primary` and only the channel events of
/// `secondary`.
///
/// All meta events of `secondary` (its header included) are dropped, so the header block of the
/// result is the header block of `primary`.
pub fn merge_two<D: MIDINum>(primary: &Stream<D>, secondary: &Stream<D>) -> Stream<D> {
    let primary_events = wrap_infallible(primary.iter().cloned());
    let secondary_events = filter_events(
        wrap_infallible(secondary.iter().cloned()),
        |e: &Delta<D, Event>| !e.is_meta(),
    );
    collect_infallible(merge_events(primary_events, secondary_events))
}

/// Merge any number of streams into `primary`, in order.
///
/// Only `primary` contributes meta events; every other stream contributes its channel events.
pub fn merge_streams<D: MIDINum>(primary: &Stream<D>, others: &[Stream<D>]) -> Stream<D> {
    debug!(
        primary_events = primary.len(),
        streams = others.len(),
        "merging streams"
    );
    others
        .iter()
        .fold(primary.clone(), |merged, other| merge_two(&merged, other))
}

/// Merge a list of streams, using the first one as the primary.
///
/// An empty list yields an empty stream.
pub fn merge_multiple<D: MIDINum>(streams: &[Stream<D>]) -> Stream<D> {
    match streams.split_first() {
        None => Stream::new(),
        Some((primary, others)) => merge_streams(primary, others),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{
        events::{Event, MIDIEvent, MetaKind},
        sequence::{
            event::{merge_events, merge_multiple, merge_streams, merge_two, Delta},
            to_vec_result, Stream,
        },
    };

    fn stream(events: Vec<Delta<u64, Event>>) -> Stream {
        Stream::from_events(events)
    }

    fn tempo(delta: u64) -> Delta<u64, Event> {
        Event::new_delta_meta_event(delta, MetaKind::Tempo, vec![0x07, 0xA1, 0x20])
    }

    fn channel_event_counts(stream: &Stream) -> HashMap<(u64, Event), usize> {
        let mut counts = HashMap::new();
        for (time, e) in stream.iter_timed() {
            if !e.is_meta() {
                *counts.entry((time, e.event.clone())).or_insert(0) += 1;
            }
        }
        counts
    }

    #[test]
    fn interleaves_by_absolute_time() {
        let a = stream(vec![
            Event::new_delta_note_on_event(0, 9, 36, 100),
            Event::new_delta_note_off_event(100, 9, 36),
        ]);
        let b = stream(vec![
            Event::new_delta_note_on_event(50, 9, 38, 100),
            Event::new_delta_note_off_event(100, 9, 38),
        ]);

        let merged = merge_two(&a, &b);

        assert_eq!(merged.absolute_times(), vec![0, 50, 100, 150]);
        assert_eq!(
            merged.into_events(),
            vec![
                Event::new_delta_note_on_event(0, 9, 36, 100),
                Event::new_delta_note_on_event(50, 9, 38, 100),
                Event::new_delta_note_off_event(50, 9, 36),
                Event::new_delta_note_off_event(50, 9, 38),
            ]
        );
    }

    #[test]
    fn ties_prefer_the_primary() {
        let a = stream(vec![Event::new_delta_note_on_event(10, 9, 36, 100)]);
        let b = stream(vec![Event::new_delta_note_on_event(10, 9, 42, 100)]);

        let merged = merge_two(&a, &b);
        assert_eq!(merged[0].event, Event::new_note_on_event(9, 36, 100));
        assert_eq!(merged[1].event, Event::new_note_on_event(9, 42, 100));
        assert_eq!(merged[1].delta, 0);

        let swapped = merge_two(&b, &a);
        assert_eq!(swapped[0].event, Event::new_note_on_event(9, 42, 100));
    }

    #[test]
    fn drops_secondary_meta_events_only() {
        let a = stream(vec![
            tempo(0),
            Event::new_delta_note_on_event(0, 9, 36, 100),
            tempo(40),
            Event::new_delta_note_off_event(20, 9, 36),
        ]);
        let b = stream(vec![
            tempo(0),
            Event::new_delta_note_on_event(30, 9, 38, 100),
            tempo(10),
            Event::new_delta_note_off_event(30, 9, 38),
        ]);

        let merged = merge_two(&a, &b);

        assert_eq!(merged.len(), a.len() + b.len() - 2);
        assert_eq!(merged.header_block(), a.header_block());
        assert_eq!(merged.absolute_times(), vec![0, 0, 30, 40, 60, 70]);
        assert_eq!(merged.iter().filter(|e| e.is_meta()).count(), 2);
    }

    #[test]
    fn preserves_the_order_within_each_input() {
        let a = stream(vec![
            Event::new_delta_note_on_event(5, 9, 36, 100),
            Event::new_delta_note_on_event(0, 9, 37, 100),
            Event::new_delta_note_off_event(5, 9, 36),
            Event::new_delta_note_off_event(0, 9, 37),
        ]);
        let b = stream(vec![
            Event::new_delta_note_on_event(5, 9, 50, 100),
            Event::new_delta_note_off_event(5, 9, 50),
        ]);

        let merged = merge_two(&a, &b);
        let keys: Vec<u8> = merged.iter().filter_map(|e| e.key()).collect();
        assert_eq!(keys, vec![36, 37, 50, 36, 37, 50]);
    }

    #[test]
    fn merges_lists_with_an_explicit_primary() {
        let a = stream(vec![tempo(0), Event::new_delta_note_on_event(0, 9, 36, 100)]);
        let b = stream(vec![tempo(0), Event::new_delta_note_on_event(15, 9, 38, 100)]);
        let c = stream(vec![Event::new_delta_note_on_event(5, 9, 42, 100)]);

        let merged = merge_streams(&a, &[b.clone(), c.clone()]);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.absolute_times(), vec![0, 0, 5, 15]);
        assert_eq!(merged, merge_multiple(&[a, b, c]));
    }

    #[test]
    fn merged_content_is_the_union_of_inputs() {
        let a = stream(vec![
            tempo(0),
            Event::new_delta_note_on_event(0, 9, 36, 100),
            Event::new_delta_note_off_event(10, 9, 36),
        ]);
        let b = stream(vec![
            Event::new_delta_note_on_event(10, 9, 36, 90),
            Event::new_delta_control_event(3, 0xB9, vec![64, 127]),
            Event::new_delta_note_off_event(7, 9, 36),
        ]);
        let c = stream(vec![
            Event::new_delta_note_on_event(2, 9, 46, 80),
            Event::new_delta_note_off_event(30, 9, 46),
        ]);

        let merged = merge_multiple(&[a.clone(), b.clone(), c.clone()]);
        let regrouped = merge_multiple(&[a.clone(), merge_two(&b, &c)]);

        let mut expected = channel_event_counts(&a);
        for other in [&b, &c] {
            for (key, count) in channel_event_counts(other) {
                *expected.entry(key).or_insert(0) += count;
            }
        }

        assert_eq!(channel_event_counts(&merged), expected);
        assert_eq!(channel_event_counts(&regrouped), expected);
        let times = merged.absolute_times();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn merging_nothing_yields_an_empty_stream() {
        let merged: Stream = merge_multiple(&[]);
        assert!(merged.is_empty());
    }

    #[test]
    fn lazy_merge_reports_errors_after_the_last_good_event() {
        let good: Vec<Result<Delta<u64, Event>, &str>> =
            vec![Ok(Event::new_delta_note_on_event(0, 0, 60, 100))];
        let bad: Vec<Result<Delta<u64, Event>, &str>> = vec![
            Ok(Event::new_delta_note_on_event(10, 0, 62, 100)),
            Err("corrupt"),
        ];

        let result: Result<Vec<_>, _> =
            to_vec_result(merge_events(good.into_iter(), bad.into_iter()));
        assert_eq!(result.unwrap_err(), "corrupt");
    }
}
