//! Error types for mnist-stream

use std::io;
use thiserror::Error;

use crate::dataset::ArchiveKind;

/// Top-level library error
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Dataset is already loaded")]
    AlreadyLoaded,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Chunk source errors (stream could not be read to completion)
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to read chunk: {0}")]
    Io(#[from] io::Error),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Compressed payload errors
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed compressed data: {0}")]
    Malformed(String),

    #[error("Compressed stream ended before its footer")]
    Truncated,
}

/// IDX header and payload errors
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Invalid {kind} magic: expected 0x{expected:08X}, got 0x{actual:08X}")]
    InvalidMagic {
        kind: ArchiveKind,
        expected: u32,
        actual: u32,
    },

    #[error("{kind} archive too small: {size} bytes, minimum {minimum} bytes")]
    TooShort {
        kind: ArchiveKind,
        size: usize,
        minimum: usize,
    },

    #[error("{kind} archive declares zero records")]
    EmptyArchive { kind: ArchiveKind },

    #[error("Invalid image geometry: {rows}x{cols}")]
    ZeroDimension { rows: u32, cols: u32 },

    #[error("Image geometry too large: {record_count} records of {rows}x{cols}")]
    GeometryOverflow {
        record_count: u32,
        rows: u32,
        cols: u32,
    },

    #[error("Record count mismatch: {images} images, {labels} labels")]
    CountMismatch { images: u32, labels: u32 },

    #[error("{kind} archive truncated: {size} bytes, expected {expected} bytes")]
    Truncated {
        kind: ArchiveKind,
        size: usize,
        expected: usize,
    },
}

impl From<io::Error> for LoaderError {
    fn from(err: io::Error) -> Self {
        LoaderError::Transport(TransportError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
