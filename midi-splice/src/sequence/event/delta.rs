use std::{
    io::Write,
    ops::{Deref, DerefMut},
};

use crate::{
    events::{
        encode_var_length_value, MIDIDelta, MIDIEvent, MIDIEventEnum, SerializeEvent,
        SerializeEventWithDelta,
    },
    io::MIDIWriteError,
    num::{MIDINum, MIDINumInto},
};

/// An event paired with the time elapsed since the previous event of its sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delta<D: MIDINum, E> {
    pub delta: D,
    pub event: E,
}

impl<D: MIDINum, E> MIDIDelta<D> for Delta<D, E> {
    #[inline(always)]
    fn delta(&self) -> D {
        self.delta
    }

    #[inline(always)]
    fn delta_mut(&mut self) -> &mut D {
        &mut self.delta
    }
}

impl<D: MIDINum, E> Delta<D, E> {
    #[inline(always)]
    pub fn new(delta: D, event: E) -> Self {
        Self { delta, event }
    }

    /// The same event with a different delta.
    #[inline(always)]
    pub fn with_delta(self, delta: D) -> Self {
        Self {
            delta,
            event: self.event,
        }
    }
}

impl<D: MIDINum, E> Deref for Delta<D, E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.event
    }
}

impl<D: MIDINum, E> DerefMut for Delta<D, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.event
    }
}

impl<D: MIDINum, E: MIDIEventEnum> MIDIEvent for Delta<D, E> {
    fn key(&self) -> Option<u8> {
        self.event.key()
    }

    fn channel(&self) -> Option<u8> {
        self.event.channel()
    }
}

impl<D: MIDINum, E: MIDIEventEnum> MIDIEventEnum for Delta<D, E> {
    #[inline(always)]
    fn as_event(&self) -> &crate::events::Event {
        self.event.as_event()
    }
}

impl<D: MIDINum, E: SerializeEvent> SerializeEvent for Delta<D, E> {
    fn serialize_event<T: Write>(&self, buf: &mut T) -> Result<usize, MIDIWriteError> {
        self.event.serialize_event(buf)
    }
}

impl<D: MIDINum, E: SerializeEvent> SerializeEventWithDelta for Delta<D, E> {
    fn serialize_delta<T: Write>(&self, buf: &mut T) -> Result<usize, MIDIWriteError> {
        let vec = encode_var_length_value(self.delta.midi_num_into());
        buf.write_all(&vec)?;
        Ok(vec.len())
    }
}
