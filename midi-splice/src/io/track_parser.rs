use crate::{events::*, sequence::event::Delta};

use super::{errors::MIDIParseError, readers::TrackReader};

/// Decodes the events of one track chunk.
///
/// Handles running status and decodes a note on with velocity 0 as a note off. The end-of-track
/// meta event is yielded with its delta as the last item; the iterator also ends after the first
/// error.
pub struct TrackParser<T: TrackReader> {
    reader: T,
    pushback: Option<u8>,
    prev_command: Option<u8>,
    ended: bool,
}

impl<T: TrackReader> TrackParser<T> {
    pub fn new(reader: T) -> Self {
        Self {
            reader,
            pushback: None,
            prev_command: None,
            ended: false,
        }
    }

    fn read(&mut self) -> Result<u8, MIDIParseError> {
        if let Some(p) = self.pushback.take() {
            return Ok(p);
        }
        self.reader.read()
    }

    fn read_fast(&mut self) -> Result<u8, MIDIParseError> {
        self.reader.read()
    }

    fn read_var_length(&mut self) -> Result<u64, MIDIParseError> {
        let mut n: u64 = 0;
        loop {
            let byte = self.read()?;
            n = (n << 7) | (byte & 0x7F) as u64;
            if (byte & 0x80) == 0 {
                break;
            }
        }
        Ok(n)
    }

    fn read_data(&mut self, size: u64) -> Result<Vec<u8>, MIDIParseError> {
        let mut data = Vec::with_capacity(size.min(1 << 16) as usize);
        for _ in 0..size {
            data.push(self.read_fast()?);
        }
        Ok(data)
    }

    /// Reads a channel message data byte. A byte with the top bit set is a status byte.
    fn read_data_byte(&mut self) -> Result<u8, MIDIParseError> {
        let byte = self.read()?;
        if byte >= 0x80 {
            return Err(self.corrupt());
        }
        Ok(byte)
    }

    fn corrupt(&self) -> MIDIParseError {
        MIDIParseError::CorruptEvent {
            track_number: self.reader.track_number(),
            position: self.reader.pos(),
        }
    }

    fn parse_event(&mut self) -> Result<Delta<u64, Event>, MIDIParseError> {
        let delta = self.read_var_length()?;
        let mut command = self.read()?;
        if command < 0x80 {
            self.pushback = Some(command);
            command = self.prev_command.ok_or_else(|| self.corrupt())?;
        }

        if command < 0xF0 {
            self.prev_command = Some(command);
            let channel = command & 0x0F;
            let event = match command & 0xF0 {
                0x80 => {
                    let key = self.read_data_byte()?;
                    let _vel = self.read_data_byte()?;
                    Event::new_delta_note_off_event(delta, channel, key)
                }
                0x90 => {
                    let key = self.read_data_byte()?;
                    let vel = self.read_data_byte()?;
                    if vel == 0 {
                        Event::new_delta_note_off_event(delta, channel, key)
                    } else {
                        Event::new_delta_note_on_event(delta, channel, key, vel)
                    }
                }
                0xC0 | 0xD0 => {
                    let value = self.read_data_byte()?;
                    Event::new_delta_control_event(delta, command, vec![value])
                }
                _ => {
                    let var1 = self.read_data_byte()?;
                    let var2 = self.read_data_byte()?;
                    Event::new_delta_control_event(delta, command, vec![var1, var2])
                }
            };
            return Ok(event);
        }

        let event = match command {
            0xF0 | 0xF7 => {
                let size = self.read_var_length()?;
                let data = self.read_data(size)?;
                Event::new_delta_control_event(delta, command, data)
            }
            0xF1 | 0xF3 => {
                let data = self.read_data(1)?;
                Event::new_delta_control_event(delta, command, data)
            }
            0xF2 => {
                let data = self.read_data(2)?;
                Event::new_delta_control_event(delta, command, data)
            }
            0xFF => {
                let kind = MetaKind::from_val(self.read_fast()?);
                let size = self.read_var_length()?;
                let data = self.read_data(size)?;
                if kind == MetaKind::EndOfTrack {
                    self.ended = true;
                }
                Event::new_delta_meta_event(delta, kind, data)
            }
            _ => Event::new_delta_control_event(delta, command, Vec::new()),
        };
        Ok(event)
    }
}

impl<T: TrackReader> Iterator for TrackParser<T> {
    type Item = Result<Delta<u64, Event>, MIDIParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ended {
            return None;
        }

        match self.parse_event() {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                self.ended = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        events::{Event, MetaKind},
        io::{readers::RAMTrackReader, MIDIParseError, TrackParser},
        sequence::event::Delta,
    };

    fn parse(bytes: Vec<u8>) -> Vec<Result<Delta<u64, Event>, MIDIParseError>> {
        TrackParser::new(RAMTrackReader::new_from_vec(bytes)).collect()
    }

    #[test]
    fn decodes_running_status_and_silent_note_ons() {
        let events: Vec<_> = parse(vec![
            0x00, 0x99, 36, 100, // note on
            0x60, 38, 90, // running status note on
            0x10, 36, 0, // running status, velocity 0
            0x00, 0xFF, 0x2F, 0x00,
        ])
        .into_iter()
        .map(|e| e.unwrap())
        .collect();

        assert_eq!(
            events,
            vec![
                Event::new_delta_note_on_event(0u64, 9, 36, 100),
                Event::new_delta_note_on_event(0x60, 9, 38, 90),
                Event::new_delta_note_off_event(0x10, 9, 36),
                Event::end_of_track(0),
            ]
        );
    }

    #[test]
    fn decodes_meta_control_and_sysex() {
        let events: Vec<_> = parse(vec![
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo
            0x00, 0xC9, 0x05, // program change
            0x81, 0x00, 0xB9, 0x07, 0x64, // delta 128, volume
            0x00, 0xF0, 0x03, 0x7E, 0x09, 0xF7, // sysex
            0x00, 0xFF, 0x2F, 0x00,
            0x00, 0x99, 36, 100, // after the end marker
        ])
        .into_iter()
        .map(|e| e.unwrap())
        .collect();

        assert_eq!(
            events,
            vec![
                Event::new_delta_meta_event(0u64, MetaKind::Tempo, vec![0x07, 0xA1, 0x20]),
                Event::new_delta_control_event(0, 0xC9, vec![0x05]),
                Event::new_delta_control_event(128, 0xB9, vec![0x07, 0x64]),
                Event::new_delta_control_event(0, 0xF0, vec![0x7E, 0x09, 0xF7]),
                Event::end_of_track(0),
            ]
        );
    }

    #[test]
    fn data_byte_without_status_is_corrupt() {
        let events = parse(vec![0x00, 0x24, 0x64]);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Err(MIDIParseError::CorruptEvent { .. })
        ));
    }

    #[test]
    fn keeps_the_end_marker_delta() {
        let events: Vec<_> = parse(vec![
            0x00, 0x99, 36, 100, //
            0x64, 0x89, 36, 0x40, // delta 100
            0x8E, 0x1C, 0xFF, 0x2F, 0x00, // delta 1820
        ])
        .into_iter()
        .map(|e| e.unwrap())
        .collect();

        assert_eq!(events.len(), 3);
        assert_eq!(events[2], Event::end_of_track(1820));
    }

    #[test]
    fn status_byte_in_note_data_is_corrupt() {
        let events = parse(vec![0x00, 0x99, 0xA4, 100, 0x00, 0xFF, 0x2F, 0x00]);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Err(MIDIParseError::CorruptEvent { .. })
        ));

        let events = parse(vec![0x00, 0x89, 36, 0xC0, 0x00, 0xFF, 0x2F, 0x00]);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
    }

    #[test]
    fn truncated_track_is_an_error() {
        let events = parse(vec![0x00, 0x99, 36]);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Err(MIDIParseError::UnexpectedTrackEnd { .. })
        ));
    }
}
