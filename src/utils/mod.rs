//! Utility modules

pub mod error;

pub use error::{DecodeError, FormatError, LoaderError, Result, TransportError};
