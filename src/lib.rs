//! mnist-stream library
//!
//! Endless batch loader for gzip-compressed IDX archives (MNIST layout).
//! Call [`Dataset::load`] once, then [`Dataset::next_batch`] as often as needed.

pub mod config;
pub mod dataset;
pub mod report;
pub mod utils;

pub use dataset::{Batch, ChunkSource, Dataset, Encoding, Geometry, LoadOptions, SampleEntry};
pub use utils::{DecodeError, FormatError, LoaderError, Result, TransportError};
