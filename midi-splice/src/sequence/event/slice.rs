use tracing::{debug, trace};

use crate::{
    events::{Event, KeyEvent, MAX_KEY},
    num::{MIDINum, MIDINumFrom},
    sequence::{Stream, StreamError},
};

use super::Delta;

/// The bar grid used to cut a stream into windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub ticks_per_beat: u16,
    pub beats_per_bar: u32,
    /// Number of bars per window.
    pub bar_step: u32,
}

impl TimeWindow {
    pub fn new(ticks_per_beat: u16, beats_per_bar: u32, bar_step: u32) -> Self {
        Self {
            ticks_per_beat,
            beats_per_bar,
            bar_step,
        }
    }

    /// Window length in ticks.
    pub fn len_ticks(&self) -> u64 {
        self.ticks_per_beat as u64 * self.beats_per_bar as u64 * self.bar_step as u64
    }
}

/// One slice of a stream, covering `[start, end)` in the source's absolute time.
#[derive(Debug, Clone, PartialEq)]
pub struct Window<D: MIDINum = u64> {
    pub index: usize,
    pub start: D,
    pub end: D,
    /// `None` when no note or control event of the source starts at or after `start`.
    pub content: Option<Stream<D>>,
}

impl<D: MIDINum> Window<D> {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

/// Notes sounding at the current point of a window, by key.
///
/// Keyed by pitch only: two simultaneous notes with the same key on different channels share an
/// entry, and only the most recent channel is remembered.
struct NoteState {
    channels: [Option<u8>; MAX_KEY as usize + 1],
}

impl NoteState {
    fn new() -> Self {
        Self {
            channels: [None; MAX_KEY as usize + 1],
        }
    }

    fn note_on(&mut self, event: &impl KeyEvent) {
        if let Some(slot) = self.channels.get_mut(event.key() as usize) {
            *slot = Some(event.channel());
        }
    }

    fn note_off(&mut self, event: &impl KeyEvent) {
        if let Some(slot) = self.channels.get_mut(event.key() as usize) {
            *slot = None;
        }
    }

    /// Hanging notes as `(key, channel)`, lowest key first.
    fn hanging(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.channels
            .iter()
            .enumerate()
            .filter_map(|(key, channel)| channel.map(|channel| (key as u8, channel)))
    }
}

/// Cut `stream` into consecutive windows of `window_len` ticks.
///
/// The window count is the total length of the stream divided by `window_len`, rounded up. Each
/// non-empty window starts with the header block of the source, holds the events that fall inside
/// it (timed relative to the window start), closes every note still sounding with a note off on
/// the window's last tick and ends with an end-of-track marker.
///
/// ## Example
///```
/// use midi_splice::{
///     events::Event,
///     sequence::{event::slice_stream, Stream},
/// };
///
/// let stream = Stream::from_events(vec![
///     Event::new_delta_note_on_event(0u64, 9, 36, 100),
///     Event::new_delta_note_off_event(3000, 9, 36),
/// ]);
///
/// let windows = slice_stream(&stream, 1920).unwrap();
/// assert_eq!(windows.len(), 2);
///
/// let first = windows[0].content.as_ref().unwrap();
/// assert_eq!(
///     first.events(),
///     &[
///         Event::new_delta_note_on_event(0u64, 9, 36, 100),
///         Event::new_delta_note_off_event(1919, 9, 36),
///         Event::end_of_track(0),
///     ]
/// );
///```
pub fn slice_stream<D: MIDINum>(
    stream: &Stream<D>,
    window_len: D,
) -> Result<Vec<Window<D>>, StreamError> {
    if stream.is_empty() {
        return Err(StreamError::MalformedStream("cannot slice a stream with no events"));
    }
    if window_len <= D::zero() {
        return Err(StreamError::ZeroWindowLength);
    }

    let header = stream.header_block();
    let times = stream.absolute_times();
    let total = stream.total_ticks();

    let mut windows = Vec::new();
    let mut start = D::zero();
    while start < total {
        let end = start + window_len;
        let content = slice_window(stream, &times, header, start, end);
        trace!(
            index = windows.len(),
            %start,
            %end,
            events = content.as_ref().map(|s| s.len()).unwrap_or(0),
            "sliced window"
        );
        windows.push(Window {
            index: windows.len(),
            start,
            end,
            content,
        });
        start = end;
    }

    debug!(
        windows = windows.len(),
        %window_len,
        %total,
        "sliced stream"
    );
    Ok(windows)
}

/// Cut `stream` into windows of `bar_step` bars.
pub fn slice_into_bars<D: MIDINum>(
    stream: &Stream<D>,
    window: TimeWindow,
) -> Result<Vec<Window<D>>, StreamError> {
    slice_stream(stream, D::midi_num_from(window.len_ticks()))
}

fn slice_window<D: MIDINum>(
    stream: &Stream<D>,
    times: &[D],
    header: &[Delta<D, Event>],
    start: D,
    end: D,
) -> Option<Stream<D>> {
    let first = stream
        .iter()
        .zip(times.iter())
        .position(|(e, time)| !e.is_meta() && *time >= start)?;

    let mut window = Stream::with_capacity(header.len() + 8);
    for e in header {
        window.push(e.clone());
    }

    let mut notes = NoteState::new();
    let mut last_time = start;
    for (e, time) in stream[first..].iter().zip(times[first..].iter()) {
        if *time >= end {
            break;
        }
        // The window gets its own end marker; a copied one would sit mid-window.
        if e.is_end_of_track() {
            continue;
        }
        match &e.event {
            Event::NoteOn(on) => notes.note_on(on),
            Event::NoteOff(off) => notes.note_off(off),
            _ => {}
        }
        window.push(e.clone().with_delta(time.gap_since(last_time)));
        last_time = *time;
    }

    let last_tick = end - D::one();
    let mut close_delta = last_tick.gap_since(last_time);
    for (key, channel) in notes.hanging() {
        trace!(key, channel, "closing hanging note");
        window.push(Event::new_delta_note_off_event(close_delta, channel, key));
        close_delta = D::zero();
    }
    window.push(Event::end_of_track(D::zero()));

    Some(window)
}
