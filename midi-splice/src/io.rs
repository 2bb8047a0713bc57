mod errors;
mod midi_file;
mod midi_writer;
pub mod readers;
mod track_parser;

pub use errors::*;
pub use midi_file::*;
pub use midi_writer::*;
pub use track_parser::*;
