use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tracing::trace;

use crate::{
    events::{Event, SerializeEventWithDelta},
    num::MIDINum,
    sequence::{event::Delta, Stream},
};

use super::errors::MIDIWriteError;

fn encode_u16(val: u16) -> [u8; 2] {
    val.to_be_bytes()
}

fn encode_u32(val: u32) -> [u8; 4] {
    val.to_be_bytes()
}

/// Writes streams as single-track (format 0) Standard MIDI Files.
pub struct MIDIWriter;

impl MIDIWriter {
    /// Encodes the body of a track chunk.
    ///
    /// End-of-track markers inside the stream are not written; their delta is carried over to
    /// the next event. Exactly one end-of-track marker closes the track.
    pub fn encode_track<D: MIDINum>(stream: &Stream<D>) -> Result<Vec<u8>, MIDIWriteError> {
        let mut buf = Vec::new();
        let mut carried = D::zero();
        for e in stream.iter() {
            if e.is_end_of_track() {
                carried += e.delta;
                continue;
            }
            Delta::new(e.delta + carried, e.event.clone()).serialize_event_with_delta(&mut buf)?;
            carried = D::zero();
        }
        Event::end_of_track(carried).serialize_event_with_delta(&mut buf)?;
        Ok(buf)
    }

    pub fn write_stream<D: MIDINum, W: Write>(
        output: &mut W,
        ppq: u16,
        stream: &Stream<D>,
    ) -> Result<(), MIDIWriteError> {
        let track = MIDIWriter::encode_track(stream)?;

        output.write_all(b"MThd")?;
        output.write_all(&encode_u32(6))?;
        output.write_all(&encode_u16(0))?;
        output.write_all(&encode_u16(1))?;
        output.write_all(&encode_u16(ppq))?;

        output.write_all(b"MTrk")?;
        output.write_all(&encode_u32(track.len() as u32))?;
        output.write_all(&track)?;

        trace!(bytes = track.len(), events = stream.len(), "wrote track");
        Ok(())
    }

    pub fn save<D: MIDINum>(
        filename: impl AsRef<Path>,
        ppq: u16,
        stream: &Stream<D>,
    ) -> Result<(), MIDIWriteError> {
        let mut output = BufWriter::new(File::create(filename)?);
        MIDIWriter::write_stream(&mut output, ppq, stream)?;
        output.flush()?;
        Ok(())
    }
}
