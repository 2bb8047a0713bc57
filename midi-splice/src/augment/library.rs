use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::{
    io::{MIDIFile, MIDILoadError, MIDIParseError},
    sequence::Stream,
};

use super::CategoryTable;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Failed to list {dir}: {source}")]
    Walk {
        dir: PathBuf,
        source: walkdir::Error,
    },
    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        source: MIDILoadError,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: MIDIParseError,
    },
}

/// The `.mid` files directly inside `dir`, sorted by file name.
pub fn midi_files(dir: &Path) -> Result<Vec<PathBuf>, LibraryError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| LibraryError::Walk {
            dir: dir.to_path_buf(),
            source,
        })?;
        let is_midi = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mid"));
        if entry.file_type().is_file() && is_midi {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Loads the first track of a file together with the file's ticks per beat.
pub fn load_stream(path: &Path) -> Result<(Stream<u64>, u16), LibraryError> {
    let file = MIDIFile::open(path).map_err(|source| LibraryError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let stream = file.read_track(0).map_err(|source| LibraryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((stream, file.ppq()))
}

/// Example streams grouped by percussion category.
#[derive(Debug, Clone, Default)]
pub struct ExampleLibrary {
    examples: BTreeMap<String, Vec<Stream<u64>>>,
}

impl ExampleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `.mid` file of `dir` whose name starts with a category token of `table`.
    ///
    /// Files of unknown categories are ignored. Files that fail to load are skipped with a
    /// warning.
    pub fn load_dir(dir: &Path, table: &CategoryTable) -> Result<Self, LibraryError> {
        let mut library = ExampleLibrary::new();
        for path in midi_files(dir)? {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let Some(category) = table.category_of(&stem) else {
                trace!(path = %path.display(), "no category, skipping");
                continue;
            };

            match load_stream(&path) {
                Ok((stream, _)) => library.insert(category, stream),
                Err(e) => warn!(error = %e, "skipping example"),
            }
        }

        debug!(
            dir = %dir.display(),
            examples = library.total(),
            categories = library.examples.len(),
            "loaded example library"
        );
        Ok(library)
    }

    pub fn insert(&mut self, category: impl Into<String>, stream: Stream<u64>) {
        self.examples.entry(category.into()).or_default().push(stream);
    }

    /// Number of examples of a category.
    pub fn count(&self, category: &str) -> usize {
        self.examples.get(category).map(Vec::len).unwrap_or(0)
    }

    /// Number of examples across all categories.
    pub fn total(&self) -> usize {
        self.examples.values().map(Vec::len).sum()
    }

    pub fn get(&self, category: &str, index: usize) -> Option<&Stream<u64>> {
        self.examples.get(category)?.get(index)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{events::Event, io::MIDIWriter};

    use super::*;

    fn pattern(key: u8) -> Stream<u64> {
        Stream::from_events(vec![
            Event::new_delta_note_on_event(0u64, 9, key, 100),
            Event::new_delta_note_off_event(240, 9, key),
            Event::end_of_track(0),
        ])
    }

    #[test]
    fn groups_files_by_leading_token() {
        let dir = tempfile::tempdir().unwrap();
        MIDIWriter::save(dir.path().join("sna_groove1.mid"), 480, &pattern(38)).unwrap();
        MIDIWriter::save(dir.path().join("sna_groove2.mid"), 480, &pattern(40)).unwrap();
        MIDIWriter::save(dir.path().join("kick_four.mid"), 480, &pattern(36)).unwrap();
        MIDIWriter::save(dir.path().join("bass_line.mid"), 480, &pattern(33)).unwrap();
        fs::write(dir.path().join("sna_notes.txt"), "not midi").unwrap();

        let library = ExampleLibrary::load_dir(dir.path(), &CategoryTable::default()).unwrap();

        assert_eq!(library.total(), 3);
        assert_eq!(library.count("sna"), 2);
        assert_eq!(library.count("kick"), 1);
        assert_eq!(library.count("toms"), 0);
        assert_eq!(library.count("bass"), 0);
        assert_eq!(library.get("sna", 0).unwrap(), &pattern(38));
        assert_eq!(library.get("sna", 1).unwrap(), &pattern(40));
        assert!(library.get("sna", 2).is_none());
    }

    #[test]
    fn skips_unreadable_examples() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cym_broken.mid"), b"MThd").unwrap();
        MIDIWriter::save(dir.path().join("cym_ride.mid"), 480, &pattern(51)).unwrap();

        let library = ExampleLibrary::load_dir(dir.path(), &CategoryTable::default()).unwrap();
        assert_eq!(library.count("cym"), 1);
        assert_eq!(library.get("cym", 0).unwrap(), &pattern(51));
    }

    #[test]
    fn lists_midi_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mid", "a.MID", "c.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.mid")).unwrap();

        let names: Vec<String> = midi_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.MID", "b.mid"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            midi_files(&dir.path().join("nope")),
            Err(LibraryError::Walk { .. })
        ));
    }
}
