use std::fmt;

use tracing::debug;

use crate::{
    events::{Event, MIDIEvent, MAX_KEY},
    num::MIDINum,
    sequence::{collect_infallible, wrap_infallible, Stream, StreamError},
};

use super::{filter_events, Delta};

/// A set of note identifiers in `0..=127`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeySet(u128);

impl KeySet {
    pub const fn empty() -> Self {
        KeySet(0)
    }

    /// Every valid note identifier.
    pub const fn all() -> Self {
        KeySet(u128::MAX)
    }

    /// Builds a set from arbitrary integers, rejecting anything outside `0..=127`.
    pub fn from_keys<K, I>(keys: I) -> Result<Self, StreamError>
    where
        K: Copy + Into<i64>,
        I: IntoIterator<Item = K>,
    {
        let mut set = KeySet::empty();
        for key in keys {
            let key: i64 = key.into();
            if !(0..=MAX_KEY as i64).contains(&key) {
                return Err(StreamError::UnknownNoteIdentifier { key });
            }
            set.0 |= 1u128 << key;
        }
        Ok(set)
    }

    pub fn contains(&self, key: u8) -> bool {
        key <= MAX_KEY && self.0 & (1u128 << key) != 0
    }

    pub fn complement(&self) -> Self {
        KeySet(!self.0)
    }

    pub fn union(&self, other: &KeySet) -> Self {
        KeySet(self.0 | other.0)
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=MAX_KEY).filter(move |key| self.contains(*key))
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<u8> for KeySet {
    /// Collects keys, silently masking to the valid range. Use [`KeySet::from_keys`] at
    /// boundaries where invalid identifiers must be rejected.
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let mut set = KeySet::empty();
        for key in iter {
            set.0 |= 1u128 << (key & MAX_KEY);
        }
        set
    }
}

/// Keep the header block and the note on/off events whose key is in `keys`.
///
/// Control events and meta events after the header are dropped. Retained events keep their
/// absolute times: each one's delta is the gap to the previously retained event. The result
/// ends with an end-of-track marker directly after the last retained event.
///
/// ## Example
///```
/// use midi_splice::{
///     events::Event,
///     sequence::{event::{partition_keys, KeySet}, Stream},
/// };
///
/// let stream = Stream::from_events(vec![
///     Event::new_delta_note_on_event(0u64, 9, 36, 100),
///     Event::new_delta_note_on_event(10, 9, 38, 100),
///     Event::new_delta_note_on_event(10, 9, 36, 100),
///     Event::new_delta_note_on_event(10, 9, 40, 100),
/// ]);
///
/// let kicks = partition_keys(&stream, &KeySet::from_keys([36u8]).unwrap());
/// assert_eq!(
///     kicks.events(),
///     &[
///         Event::new_delta_note_on_event(0u64, 9, 36, 100),
///         Event::new_delta_note_on_event(20, 9, 36, 100),
///         Event::end_of_track(0),
///     ]
/// );
///```
pub fn partition_keys<D: MIDINum>(stream: &Stream<D>, keys: &KeySet) -> Stream<D> {
    let header_len = stream.header_len();
    let body = filter_events(
        wrap_infallible(stream[header_len..].iter().cloned()),
        |e: &Delta<D, Event>| e.is_note() && e.key().map(|k| keys.contains(k)).unwrap_or(false),
    );

    let mut partitioned: Stream<D> = stream.header_block().iter().cloned().collect();
    for e in collect_infallible::<_, Vec<_>, _>(body) {
        partitioned.push(e);
    }
    partitioned.push(Event::end_of_track(D::zero()));

    debug!(
        kept = partitioned.len() - header_len - 1,
        of = stream.len() - header_len,
        keys = ?keys,
        "partitioned stream by key"
    );
    partitioned
}

/// Remove the note on/off events whose key is in `keys`.
///
/// Same as [`partition_keys`] with the complement of `keys`.
pub fn delete_keys<D: MIDINum>(stream: &Stream<D>, keys: &KeySet) -> Stream<D> {
    partition_keys(stream, &keys.complement())
}

/// Like [`partition_keys`], validating the note identifiers first.
pub fn select_notes<D, K>(stream: &Stream<D>, notes: &[K]) -> Result<Stream<D>, StreamError>
where
    D: MIDINum,
    K: Copy + Into<i64>,
{
    Ok(partition_keys(stream, &KeySet::from_keys(notes.iter().copied())?))
}

/// Like [`delete_keys`], validating the note identifiers first.
pub fn delete_notes<D, K>(stream: &Stream<D>, notes: &[K]) -> Result<Stream<D>, StreamError>
where
    D: MIDINum,
    K: Copy + Into<i64>,
{
    Ok(delete_keys(stream, &KeySet::from_keys(notes.iter().copied())?))
}
