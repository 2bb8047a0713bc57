use crate::{
    events::{Event, MetaEvent, MetaKind},
    num::MIDINum,
    sequence::{collect_infallible, wrap_infallible, Stream},
};

use super::Delta;

/// Replace the payload of every tempo event in a sequence. Deltas are left untouched.
///
/// ## Example
///```
/// use midi_splice::{
///     events::{Event, MetaEvent},
///     pipe,
///     sequence::{event::{replace_tempo, Delta}, to_vec_result, wrap_ok},
/// };
///
/// let events = vec![
///     Delta::new(0u64, MetaEvent::tempo(500_000).as_event()),
///     Event::new_delta_note_on_event(0, 9, 36, 100),
///     Delta::new(480, MetaEvent::tempo(400_000).as_event()),
/// ];
///
/// let changed: Vec<_> = pipe! {
///     events.into_iter()
///     |>wrap_ok()
///     |>replace_tempo(600_000)
///     |>to_vec_result().unwrap()
/// };
///
/// assert_eq!(
///     changed,
///     vec![
///         Delta::new(0u64, MetaEvent::tempo(600_000).as_event()),
///         Event::new_delta_note_on_event(0, 9, 36, 100),
///         Delta::new(480, MetaEvent::tempo(600_000).as_event()),
///     ]
/// )
///```
pub fn replace_tempo<D, Err, I>(
    iter: I,
    micros_per_beat: u32,
) -> impl Iterator<Item = Result<Delta<D, Event>, Err>>
where
    D: MIDINum,
    I: Iterator<Item = Result<Delta<D, Event>, Err>> + Sized,
{
    iter.map(move |e| {
        let mut e = e?;
        if let Event::Meta(meta) = &mut e.event {
            if meta.kind == MetaKind::Tempo {
                **meta = MetaEvent::tempo(micros_per_beat);
            }
        }
        Ok(e)
    })
}

/// [`replace_tempo`] over a whole stream.
pub fn rewrite_tempo<D: MIDINum>(stream: &Stream<D>, micros_per_beat: u32) -> Stream<D> {
    collect_infallible(replace_tempo(
        wrap_infallible(stream.iter().cloned()),
        micros_per_beat,
    ))
}

#[cfg(test)]
mod tests {
    use crate::{
        events::{Event, MetaEvent, MetaKind},
        sequence::{
            event::{rewrite_tempo, Delta},
            Stream,
        },
    };

    #[test]
    fn rewrites_every_tempo_event() {
        let stream = Stream::from_events(vec![
            Delta::new(0u64, MetaEvent::tempo(500_000).as_event()),
            Event::new_delta_meta_event(0, MetaKind::TimeSignature, vec![4, 2, 24, 8]),
            Event::new_delta_note_on_event(0, 9, 36, 100),
            Delta::new(960, MetaEvent::tempo(300_000).as_event()),
            Event::new_delta_note_off_event(10, 9, 36),
            Event::end_of_track(0),
        ]);

        let rewritten = rewrite_tempo(&stream, 750_000);

        assert_eq!(rewritten.len(), stream.len());
        assert_eq!(rewritten.absolute_times(), stream.absolute_times());
        let tempos: Vec<Option<u32>> = rewritten
            .iter()
            .filter_map(|e| match &e.event {
                Event::Meta(meta) if meta.kind == MetaKind::Tempo => Some(meta.tempo_value()),
                _ => None,
            })
            .collect();
        assert_eq!(tempos, vec![Some(750_000), Some(750_000)]);
        assert_eq!(rewritten[1], stream[1]);
        assert_eq!(rewritten[4], stream[4]);
    }

    #[test]
    fn leaves_streams_without_tempo_alone() {
        let stream = Stream::from_events(vec![
            Event::new_delta_note_on_event(0u64, 9, 36, 100),
            Event::new_delta_note_off_event(10, 9, 36),
        ]);
        assert_eq!(rewrite_tempo(&stream, 600_000), stream);
    }
}
