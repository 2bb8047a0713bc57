use std::io::Write;

use crate::events::encode_var_length_value;
use crate::io::MIDIWriteError;
use crate::sequence::event::Delta;

use super::event::Event;
use super::{ChannelEvent, KeyEvent, MIDIEvent, MIDINum, SerializeEvent};
use derive::{MIDIEvent, NewEvent};

fn write_bytes<T: Write>(buf: &mut T, bytes: &[u8]) -> Result<usize, MIDIWriteError> {
    buf.write_all(bytes)?;
    Ok(bytes.len())
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq, Eq, Hash)]
pub struct NoteOnEvent {
    #[channel]
    pub channel: u8,
    #[key]
    pub key: u8,
    pub velocity: u8,
}

impl SerializeEvent for NoteOnEvent {
    fn serialize_event<T: Write>(&self, buf: &mut T) -> Result<usize, MIDIWriteError> {
        write_bytes(buf, &[0x90 | self.channel, self.key, self.velocity])
    }
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq, Eq, Hash)]
pub struct NoteOffEvent {
    #[channel]
    pub channel: u8,
    #[key]
    pub key: u8,
}

impl SerializeEvent for NoteOffEvent {
    fn serialize_event<T: Write>(&self, buf: &mut T) -> Result<usize, MIDIWriteError> {
        write_bytes(buf, &[0x80 | self.channel, self.key, 0x40])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    PolyphonicKeyPressure,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchWheelChange,
    SystemExclusive,
    SystemCommon,
}

/// Any non-note, non-meta message: channel voice messages other than note on/off, plus
/// system exclusive and system common messages.
///
/// `payload` holds the data bytes following the status byte. For system exclusive messages it
/// holds the bytes following the length prefix.
#[derive(Debug, Clone, NewEvent, PartialEq, Eq, Hash)]
pub struct ControlEvent {
    pub status: u8,
    pub payload: Vec<u8>,
}

impl ControlEvent {
    pub fn kind(&self) -> ControlKind {
        match self.status & 0xF0 {
            0xA0 => ControlKind::PolyphonicKeyPressure,
            0xB0 => ControlKind::ControlChange,
            0xC0 => ControlKind::ProgramChange,
            0xD0 => ControlKind::ChannelPressure,
            0xE0 => ControlKind::PitchWheelChange,
            _ => match self.status {
                0xF0 | 0xF7 => ControlKind::SystemExclusive,
                _ => ControlKind::SystemCommon,
            },
        }
    }
}

impl MIDIEvent for ControlEvent {
    fn key(&self) -> Option<u8> {
        match self.kind() {
            ControlKind::PolyphonicKeyPressure => self.payload.first().copied(),
            _ => None,
        }
    }

    fn channel(&self) -> Option<u8> {
        if self.status < 0xF0 {
            Some(self.status & 0x0F)
        } else {
            None
        }
    }
}

impl SerializeEvent for ControlEvent {
    fn serialize_event<T: Write>(&self, buf: &mut T) -> Result<usize, MIDIWriteError> {
        let mut vec = Vec::with_capacity(self.payload.len() + 5);
        vec.push(self.status);
        if self.kind() == ControlKind::SystemExclusive {
            vec.append(&mut encode_var_length_value(self.payload.len() as u64));
        }
        vec.extend_from_slice(&self.payload);
        write_bytes(buf, &vec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    SequenceNumber,
    Text(u8),
    ChannelPrefix,
    MIDIPort,
    EndOfTrack,
    Tempo,
    SMPTEOffset,
    TimeSignature,
    KeySignature,
    SequencerSpecific,
    Unknown(u8),
}

impl MetaKind {
    pub fn from_val(val: u8) -> MetaKind {
        match val {
            0x00 => MetaKind::SequenceNumber,
            0x01..=0x0F => MetaKind::Text(val),
            0x20 => MetaKind::ChannelPrefix,
            0x21 => MetaKind::MIDIPort,
            0x2F => MetaKind::EndOfTrack,
            0x51 => MetaKind::Tempo,
            0x54 => MetaKind::SMPTEOffset,
            0x58 => MetaKind::TimeSignature,
            0x59 => MetaKind::KeySignature,
            0x7F => MetaKind::SequencerSpecific,
            _ => MetaKind::Unknown(val),
        }
    }

    pub fn as_val(self) -> u8 {
        match self {
            MetaKind::SequenceNumber => 0x00,
            MetaKind::Text(val) => val,
            MetaKind::ChannelPrefix => 0x20,
            MetaKind::MIDIPort => 0x21,
            MetaKind::EndOfTrack => 0x2F,
            MetaKind::Tempo => 0x51,
            MetaKind::SMPTEOffset => 0x54,
            MetaKind::TimeSignature => 0x58,
            MetaKind::KeySignature => 0x59,
            MetaKind::SequencerSpecific => 0x7F,
            MetaKind::Unknown(val) => val,
        }
    }
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq, Eq, Hash)]
pub struct MetaEvent {
    pub kind: MetaKind,
    pub payload: Vec<u8>,
}

impl MetaEvent {
    pub fn end_of_track() -> Self {
        MetaEvent::new(MetaKind::EndOfTrack, Vec::new())
    }

    /// A tempo event, in microseconds per quarter note.
    pub fn tempo(micros_per_beat: u32) -> Self {
        let bytes = micros_per_beat.to_be_bytes();
        MetaEvent::new(MetaKind::Tempo, bytes[1..].to_vec())
    }

    /// Microseconds per quarter note, if this is a well-formed tempo event.
    pub fn tempo_value(&self) -> Option<u32> {
        match (self.kind, self.payload.as_slice()) {
            (MetaKind::Tempo, [a, b, c]) => {
                Some(((*a as u32) << 16) | ((*b as u32) << 8) | *c as u32)
            }
            _ => None,
        }
    }
}

impl SerializeEvent for MetaEvent {
    fn serialize_event<T: Write>(&self, buf: &mut T) -> Result<usize, MIDIWriteError> {
        let mut vec = Vec::with_capacity(self.payload.len() + 6);
        vec.push(0xFF);
        vec.push(self.kind.as_val());
        vec.append(&mut encode_var_length_value(self.payload.len() as u64));
        vec.extend_from_slice(&self.payload);
        write_bytes(buf, &vec)
    }
}

impl Event {
    /// The end-of-track marker paired with a delta time.
    pub fn end_of_track<D: MIDINum>(delta: D) -> Delta<D, Event> {
        Delta::new(delta, MetaEvent::end_of_track().as_event())
    }
}
