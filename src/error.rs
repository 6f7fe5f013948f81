//! The errors produced while decoding and encoding MIDI streams.

use std::{io, sync::Arc};

use thiserror::Error;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error while reading or writing a MIDI stream or SMF file.
///
/// Errors from the underlying byte source or sink are passed through as
/// [`Error::Io`]. All other variants describe a violation of the MIDI wire or
/// file format, with a short message pointing at the offending construct.
///
/// The type is `Clone` (I/O errors are reference-counted) so that readers can
/// cache a failure and hand it out again, such as when the file header is
/// requested twice.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An error reported by the underlying byte source or sink.
    #[error("io error: {0}")]
    Io(Arc<io::Error>),

    /// The stream ended in the middle of a message, chunk or header.
    ///
    /// Running out of bytes at a message or chunk boundary is not an error;
    /// readers report that as a clean end of stream instead.
    #[error("unexpected eof while {0}")]
    UnexpectedEof(&'static str),

    /// A byte sequence that has no valid interpretation: a data byte out of
    /// range, a status byte where data was expected, a meta event with the
    /// wrong length, and similar.
    #[error("malformed midi: {0}")]
    MalformedData(&'static str),

    /// The file does not start with an `MThd` chunk.
    #[error("expected MThd chunk, found {:?}", String::from_utf8_lossy(.0))]
    UnexpectedChunkType([u8; 4]),

    /// The `MThd` chunk declared a body length other than 6.
    #[error("MThd chunk with body length {0}, expected 6")]
    WrongHeaderLength(u32),

    /// A chunk of an unknown type was encountered while the reader was
    /// configured to fail on them rather than skip them.
    #[error("unknown chunk type {:?}", String::from_utf8_lossy(.0))]
    UnknownChunk([u8; 4]),

    /// A write was attempted after the last declared track was finished.
    #[error("all tracks have been written")]
    FinishedAllTracks,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(Arc::new(err))
    }
}
