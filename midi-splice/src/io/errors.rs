use thiserror::Error;

/// Errors raised while locating the chunks of a file.
#[derive(Debug, Error)]
pub enum MIDILoadError {
    #[error("Corrupt chunks")]
    CorruptChunks,
    #[error("Filesystem error: {0}")]
    FilesystemError(#[from] std::io::Error),
}

/// Errors raised while decoding the events of a track.
#[derive(Debug, Error)]
pub enum MIDIParseError {
    CorruptEvent {
        track_number: Option<u32>,
        position: u64,
    },
    UnexpectedTrackEnd {
        track_number: Option<u32>,
        track_start: u64,
        expected_track_end: u64,
    },
    MissingTrack { track: usize, track_count: usize },
    FilesystemError(#[from] std::io::Error),
}

impl std::fmt::Display for MIDIParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MIDIParseError::CorruptEvent {
                track_number,
                position,
            } => match track_number {
                Some(track_number) => write!(
                    f,
                    "Corrupt event (track {track_number}, position: {position:#06x})",
                ),
                None => write!(f, "Corrupt event (position: {position:#06x})"),
            },
            MIDIParseError::UnexpectedTrackEnd {
                track_number,
                track_start,
                expected_track_end,
            } => match track_number {
                Some(track_number) => write!(f, "Unexpected track end (track {track_number}, track start: {track_start:#06x}, track end: {expected_track_end:#06x})"),
                None => write!(f, "Unexpected track end (track start: {track_start:#06x}, track end: {expected_track_end:#06x})"),
            },
            MIDIParseError::MissingTrack { track, track_count } => {
                write!(f, "Track {track} does not exist ({track_count} tracks)")
            }
            MIDIParseError::FilesystemError(e) => write!(f, "Filesystem error: {e}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MIDIWriteError {
    #[error("Filesystem error: {0}")]
    FilesystemError(#[from] std::io::Error),
}
