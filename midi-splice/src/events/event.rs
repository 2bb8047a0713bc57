use super::events::*;
use super::{MIDIEvent, SerializeEvent};
use crate::io::MIDIWriteError;

use derive::EventImpl;
use std::io::Write;

#[derive(EventImpl, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    #[note]
    NoteOn(NoteOnEvent),
    #[note]
    NoteOff(NoteOffEvent),
    Control(Box<ControlEvent>),
    #[meta]
    Meta(Box<MetaEvent>),
}

impl Event {
    /// Whether this is the end-of-track marker.
    pub fn is_end_of_track(&self) -> bool {
        match self {
            Event::Meta(meta) => meta.kind == MetaKind::EndOfTrack,
            _ => false,
        }
    }

    /// Whether this event can take part in a header block.
    ///
    /// The end-of-track marker is meta, but never part of a header.
    pub fn is_header_meta(&self) -> bool {
        self.is_meta() && !self.is_end_of_track()
    }
}
