//! Dataset loading and access
//!
//! This module turns two compressed IDX byte streams (images and labels)
//! into an endless, wrap-around sequence of labeled, normalized samples.

pub mod archive;
pub mod header;
pub mod inflate;
pub mod sampler;
pub mod source;
pub mod store;

pub use archive::{ArchiveKind, RawArchive};
pub use header::{
    read_image_header, read_label_header, read_u32_be, Geometry, IMAGE_HEADER_SIZE, IMAGE_MAGIC,
    LABEL_HEADER_SIZE, LABEL_MAGIC,
};
pub use inflate::{inflate, Encoding, Inflater};
pub use sampler::{normalize, Batch, SampleEntry, NORMALIZE_DIVISOR, NUM_CLASSES};
pub use source::{ChunkSource, MemorySource, ReaderSource, DEFAULT_CHUNK_SIZE};
pub use store::{Dataset, LoadOptions};
