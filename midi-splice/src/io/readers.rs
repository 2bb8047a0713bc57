use std::sync::Arc;

use super::errors::{MIDILoadError, MIDIParseError};

/// Byte source for a single track chunk.
pub trait TrackReader {
    fn read(&mut self) -> Result<u8, MIDIParseError>;

    /// Position relative to the start of the file.
    fn pos(&self) -> u64;

    fn track_number(&self) -> Option<u32>;
}

/// The whole file, held in memory and shared between track readers.
#[derive(Debug, Clone)]
pub struct RAMReader {
    bytes: Arc<Vec<u8>>,
}

impl RAMReader {
    pub fn new(bytes: Vec<u8>) -> RAMReader {
        RAMReader {
            bytes: Arc::new(bytes),
        }
    }

    pub fn read_bytes(&self, pos: u64, count: usize) -> Result<&[u8], MIDILoadError> {
        let start = pos as usize;
        self.bytes
            .get(start..start + count)
            .ok_or(MIDILoadError::CorruptChunks)
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn open_reader(&self, track_number: Option<u32>, start: u64, len: u64) -> RAMTrackReader {
        RAMTrackReader {
            bytes: self.bytes.clone(),
            track_number,
            start: start as usize,
            pos: start as usize,
            end: ((start + len) as usize).min(self.bytes.len()),
        }
    }
}

pub struct RAMTrackReader {
    bytes: Arc<Vec<u8>>,
    track_number: Option<u32>,
    start: usize,
    pos: usize,
    end: usize,
}

impl RAMTrackReader {
    /// A reader over raw track bytes (the contents of one `MTrk` chunk).
    pub fn new_from_vec(bytes: Vec<u8>) -> RAMTrackReader {
        let len = bytes.len();
        RAMTrackReader {
            bytes: Arc::new(bytes),
            track_number: None,
            start: 0,
            pos: 0,
            end: len,
        }
    }
}

impl TrackReader for RAMTrackReader {
    #[inline(always)]
    fn read(&mut self) -> Result<u8, MIDIParseError> {
        if self.pos == self.end {
            return Err(MIDIParseError::UnexpectedTrackEnd {
                track_number: self.track_number,
                track_start: self.start as u64,
                expected_track_end: self.end as u64,
            });
        }
        let b = self.bytes[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn pos(&self) -> u64 {
        self.pos as u64
    }

    fn track_number(&self) -> Option<u32> {
        self.track_number
    }
}
