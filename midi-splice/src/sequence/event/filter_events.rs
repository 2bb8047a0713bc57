use crate::{events::MIDIDelta, num::MIDINum};

/// Iterator returned by [`filter_events`].
pub struct FilterEvents<D: MIDINum, I, P> {
    iter: I,
    predicate: P,
    extra_delta: D,
}

impl<D, E, Err, I, P> Iterator for FilterEvents<D, I, P>
where
    D: MIDINum,
    E: MIDIDelta<D>,
    I: Iterator<Item = Result<E, Err>>,
    P: FnMut(&E) -> bool,
{
    type Item = Result<E, Err>;

    fn next(&mut self) -> Option<Self::Item> {
        for e in self.iter.by_ref() {
            let mut e = match e {
                Ok(e) => e,
                Err(e) => return Some(Err(e)),
            };
            if (self.predicate)(&e) {
                e.set_delta(e.delta() + self.extra_delta);
                self.extra_delta = D::zero();
                return Some(Ok(e));
            } else {
                self.extra_delta += e.delta();
            }
        }
        None
    }
}

/// Filter the events in a sequence based on a predicate, while carrying over the delta of the
/// removed events, so the retained events keep their absolute times.
///
/// ## Example
///```
/// use midi_splice::{
///     events::{Event, MIDIEvent},
///     pipe,
///     sequence::{event::filter_events, to_vec_result, wrap_ok},
/// };
///
/// let events = vec![
///     Event::new_delta_note_on_event(100u64, 9, 36, 127),
///     Event::new_delta_note_off_event(50, 9, 36),
///     Event::new_delta_note_on_event(30, 9, 38, 127),
///     Event::new_delta_note_off_event(80, 9, 38),
/// ];
///
/// let changed: Vec<_> = pipe! {
///     events.into_iter()
///     |>wrap_ok()
///     |>filter_events(|e| e.is_note() && e.key() == Some(36))
///     |>to_vec_result().unwrap()
/// };
///
/// assert_eq!(
///     changed,
///     vec![
///         Event::new_delta_note_on_event(100u64, 9, 36, 127),
///         Event::new_delta_note_off_event(50, 9, 36),
///     ]
/// )
///```
pub fn filter_events<D, E, Err, I, P>(iter: I, predicate: P) -> FilterEvents<D, I, P>
where
    D: MIDINum,
    E: MIDIDelta<D>,
    I: Iterator<Item = Result<E, Err>>,
    P: FnMut(&E) -> bool,
{
    FilterEvents {
        iter,
        predicate,
        extra_delta: D::zero(),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        events::Event,
        sequence::{event::filter_events, to_vec_result, wrap_ok},
    };

    #[test]
    fn carries_removed_deltas_forward() {
        let events = vec![
            Event::new_delta_note_on_event(0u64, 9, 36, 100),
            Event::new_delta_control_event(10, 0xB9, vec![7, 90]),
            Event::new_delta_note_on_event(10, 9, 38, 100),
            Event::new_delta_note_off_event(10, 9, 36),
        ];

        let filtered: Vec<_> =
            to_vec_result(filter_events(wrap_ok(events.into_iter()), |e| e.is_note())).unwrap();

        let deltas: Vec<u64> = filtered.iter().map(|e| e.delta).collect();
        assert_eq!(deltas, vec![0, 20, 10]);
    }

    #[test]
    fn stops_on_errors() {
        let items: Vec<Result<_, &str>> = vec![
            Ok(Event::new_delta_note_on_event(5u64, 0, 60, 100)),
            Err("broken"),
            Ok(Event::new_delta_note_off_event(5, 0, 60)),
        ];
        let mut iter = filter_events(items.into_iter(), |_| true);
        assert!(iter.next().unwrap().is_ok());
        assert_eq!(iter.next().unwrap().unwrap_err(), "broken");
    }
}
