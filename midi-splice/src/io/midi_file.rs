use std::{fs, io::Read, path::Path};

use tracing::trace;

use crate::{
    events::Event,
    sequence::{event::Delta, to_vec_result, Stream},
};

use super::{
    errors::{MIDILoadError, MIDIParseError},
    readers::RAMReader,
    track_parser::TrackParser,
};

#[derive(Debug)]
struct TrackPos {
    pos: u64,
    len: u32,
}

/// A Standard MIDI File loaded into memory, with its track chunks located but not decoded.
#[derive(Debug)]
pub struct MIDIFile {
    reader: RAMReader,
    track_positions: Vec<TrackPos>,

    format: u16,
    ppq: u16,
}

impl MIDIFile {
    fn new_from_reader(reader: RAMReader) -> Result<Self, MIDILoadError> {
        fn bytes_to_val(bytes: &[u8]) -> u32 {
            let mut num: u32 = 0;
            for b in bytes {
                num = (num << 8) + *b as u32;
            }

            num
        }

        fn read_header(reader: &RAMReader, pos: u64, text: &str) -> Result<u32, MIDILoadError> {
            let bytes = reader.read_bytes(pos, 8)?;
            let (header, len) = bytes.split_at(4);
            if header != text.as_bytes() {
                return Err(MIDILoadError::CorruptChunks);
            }

            Ok(bytes_to_val(len))
        }

        let mut pos = 0u64;

        let header_len = read_header(&reader, pos, "MThd")?;
        pos += 8;
        if header_len < 6 {
            return Err(MIDILoadError::CorruptChunks);
        }

        let (format, ppq) = {
            let header_data = reader.read_bytes(pos, 6)?;
            (
                bytes_to_val(&header_data[0..2]) as u16,
                bytes_to_val(&header_data[4..6]) as u16,
            )
        };
        pos += header_len as u64;

        let mut track_positions = Vec::<TrackPos>::new();
        while pos < reader.len() {
            let len = read_header(&reader, pos, "MTrk")?;
            pos += 8;
            track_positions.push(TrackPos { len, pos });
            pos += len as u64;
        }
        if pos > reader.len() {
            return Err(MIDILoadError::CorruptChunks);
        }

        trace!(format, ppq, tracks = track_positions.len(), "located track chunks");
        Ok(MIDIFile {
            reader,
            ppq,
            format,
            track_positions,
        })
    }

    pub fn open(filename: impl AsRef<Path>) -> Result<Self, MIDILoadError> {
        let bytes = fs::read(filename)?;
        MIDIFile::from_bytes(bytes)
    }

    pub fn open_from_stream<T: Read>(mut stream: T) -> Result<Self, MIDILoadError> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        MIDIFile::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, MIDILoadError> {
        MIDIFile::new_from_reader(RAMReader::new(bytes))
    }

    /// Lazily decodes one track. Panics if `track` is out of range; see [`MIDIFile::read_track`].
    pub fn iter_track(
        &self,
        track: usize,
    ) -> impl Iterator<Item = Result<Delta<u64, Event>, MIDIParseError>> {
        let pos = &self.track_positions[track];
        let reader = self
            .reader
            .open_reader(Some(track as u32), pos.pos, pos.len as u64);
        TrackParser::new(reader)
    }

    /// Decodes one track into a stream. The end-of-track marker is kept as the last event, so
    /// trailing silence counts towards [`Stream::total_ticks`].
    pub fn read_track(&self, track: usize) -> Result<Stream<u64>, MIDIParseError> {
        if track >= self.track_count() {
            return Err(MIDIParseError::MissingTrack {
                track,
                track_count: self.track_count(),
            });
        }
        to_vec_result(self.iter_track(track))
    }

    pub fn ppq(&self) -> u16 {
        self.ppq
    }

    pub fn format(&self) -> u16 {
        self.format
    }

    pub fn track_count(&self) -> usize {
        self.track_positions.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        events::Event,
        io::{MIDIFile, MIDILoadError, MIDIParseError},
    };

    fn single_track_file() -> Vec<u8> {
        let mut bytes = b"MThd".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0]);
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&[0, 0, 0, 12]);
        bytes.extend_from_slice(&[0x00, 0x99, 36, 100, 0x78, 0x89, 36, 0x40, 0x00, 0xFF, 0x2F, 0x00]);
        bytes
    }

    #[test]
    fn reads_header_and_tracks() {
        let file = MIDIFile::from_bytes(single_track_file()).unwrap();
        assert_eq!(file.format(), 0);
        assert_eq!(file.ppq(), 480);
        assert_eq!(file.track_count(), 1);

        let track = file.read_track(0).unwrap();
        assert_eq!(
            track.events(),
            &[
                Event::new_delta_note_on_event(0u64, 9, 36, 100),
                Event::new_delta_note_off_event(120, 9, 36),
                Event::end_of_track(0),
            ]
        );
    }

    #[test]
    fn missing_track_is_an_error() {
        let file = MIDIFile::from_bytes(single_track_file()).unwrap();
        assert!(matches!(
            file.read_track(1),
            Err(MIDIParseError::MissingTrack {
                track: 1,
                track_count: 1
            })
        ));
    }

    #[test]
    fn rejects_corrupt_chunks() {
        let mut bytes = single_track_file();
        bytes[0] = b'X';
        assert!(matches!(
            MIDIFile::from_bytes(bytes),
            Err(MIDILoadError::CorruptChunks)
        ));

        let mut truncated = single_track_file();
        truncated.truncate(truncated.len() - 2);
        assert!(matches!(
            MIDIFile::from_bytes(truncated),
            Err(MIDILoadError::CorruptChunks)
        ));
    }
}
