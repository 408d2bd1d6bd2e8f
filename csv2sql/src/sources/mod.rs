//! Row sources: delimited text parsing and the rewindable line buffer.

pub mod delimited;
pub mod rewindable;

pub use delimited::{parse_delimiter, DelimitedReader, DEFAULT_DELIMITER};
pub use rewindable::{
    FrozenLines, LinesReader, RewindOptions, RewindableLines, DEFAULT_BUFFER_SIZE,
};
