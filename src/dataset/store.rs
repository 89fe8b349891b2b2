//! Dataset store: load lifecycle and cyclic batch access
//!
//! A [`Dataset`] starts unloaded. `load()` drains and decompresses both
//! archives concurrently, parses the geometry from the image header and
//! validates both payloads. Only when every step succeeds are the archives
//! installed; on failure the dataset stays unloaded.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{info, trace, warn};

use super::archive::{ArchiveKind, RawArchive};
use super::header::{read_image_header, read_label_header, Geometry};
use super::inflate::{inflate, Encoding};
use super::sampler::{advance, Batch, Records, SampleEntry};
use super::source::{ChunkSource, ReaderSource, DEFAULT_CHUNK_SIZE};
use crate::utils::{FormatError, LoaderError, Result};

/// Options applied by [`Dataset::load`]
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub image_encoding: Encoding,
    pub label_encoding: Encoding,
    /// Fail when the label archive's record count differs from the image archive's
    pub check_counts: bool,
    /// Initial cursor, reduced modulo the record count
    pub start: u64,
    /// Read size used by [`Dataset::load_files`]
    pub chunk_size: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            image_encoding: Encoding::Auto,
            label_encoding: Encoding::Auto,
            check_counts: true,
            start: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Endless source of labeled, normalized samples
#[derive(Debug, Default)]
pub struct Dataset {
    options: LoadOptions,
    records: Option<Records>,
    /// Next logical record index to serve
    cursor: AtomicU64,
}

impl Dataset {
    /// Create an unloaded dataset with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unloaded dataset with custom options
    pub fn with_options(options: LoadOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Drain, decompress and parse both archives
    ///
    /// Both sources are consumed concurrently on the calling task. The first
    /// error from either side is returned and the dataset stays unloaded.
    /// Loading an already loaded dataset fails with [`LoaderError::AlreadyLoaded`].
    pub async fn load<I, L>(&mut self, mut images: I, mut labels: L) -> Result<()>
    where
        I: ChunkSource,
        L: ChunkSource,
    {
        if self.records.is_some() {
            return Err(LoaderError::AlreadyLoaded);
        }

        let (images, labels) = tokio::try_join!(
            inflate(&mut images, ArchiveKind::Images, self.options.image_encoding),
            inflate(&mut labels, ArchiveKind::Labels, self.options.label_encoding),
        )?;

        let records = validate(images, labels, self.options.check_counts)?;
        let start = self.options.start % records.record_count();
        let geometry = records.geometry;

        info!(
            "Loaded dataset: {} records of {}x{} ({} image bytes, {} label bytes)",
            geometry.record_count,
            geometry.rows,
            geometry.cols,
            records.images.len(),
            records.labels.len()
        );

        self.cursor.store(start, Ordering::Release);
        self.records = Some(records);
        Ok(())
    }

    /// Open both archive files and [`load`](Self::load) them
    pub async fn load_files<P, Q>(&mut self, images: P, labels: Q) -> Result<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let chunk_size = self.options.chunk_size;
        let (images, labels) = tokio::try_join!(
            ReaderSource::open(images, chunk_size),
            ReaderSource::open(labels, chunk_size),
        )?;
        self.load(images, labels).await
    }

    // === Accessors ===

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.records.is_some()
    }

    /// Geometry of the loaded dataset
    #[inline]
    pub fn geometry(&self) -> Option<Geometry> {
        self.records.as_ref().map(|r| r.geometry)
    }

    /// Rows per image, 0 before loading
    #[inline]
    pub fn rows(&self) -> u32 {
        self.geometry().map_or(0, |g| g.rows)
    }

    /// Columns per image, 0 before loading
    #[inline]
    pub fn cols(&self) -> u32 {
        self.geometry().map_or(0, |g| g.cols)
    }

    /// Number of records, 0 before loading
    #[inline]
    pub fn record_count(&self) -> u32 {
        self.geometry().map_or(0, |g| g.record_count)
    }

    /// Next logical record index to be served
    #[inline]
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    // === Sampling ===

    /// Serve the next `size` entries, wrapping past the end of the dataset
    ///
    /// Returns an empty batch if the dataset is not loaded. The range is
    /// claimed with a single atomic cursor update, so concurrent callers
    /// each see a consistent cursor.
    pub fn next_batch(&self, size: u32) -> Vec<SampleEntry> {
        let Some(records) = self.records.as_ref() else {
            warn!("next_batch({}) called before the dataset was loaded", size);
            return Vec::new();
        };
        if size == 0 {
            return Vec::new();
        }

        let count = records.record_count();
        let start = match self.cursor.fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
            Some(advance(c, size, count))
        }) {
            Ok(prev) | Err(prev) => prev,
        };

        trace!(
            "Batch of {} from cursor {} (next {})",
            size,
            start,
            advance(start, size, count)
        );

        records.sample(start, size)
    }

    /// Serve the next `size` entries stacked into dense tensors
    pub fn next_stacked_batch(&self, size: u32) -> Batch {
        let entries = self.next_batch(size);
        Batch::stack(&entries, self.rows() as usize, self.cols() as usize)
    }

    /// Random access to one record; does not move the cursor
    pub fn entry(&self, idx: u64) -> Option<SampleEntry> {
        self.records.as_ref()?.entry(idx)
    }

    /// Reposition the cursor (modulo the record count); ignored before loading
    pub fn seek(&self, position: u64) {
        if let Some(records) = self.records.as_ref() {
            self.cursor
                .store(position % records.record_count(), Ordering::Release);
        }
    }

    /// Get dataset summary string
    pub fn summary(&self) -> String {
        match self.geometry() {
            Some(g) => format!(
                "Dataset: {} records, {}x{} pixels, record_size={}B, cursor={}",
                g.record_count,
                g.rows,
                g.cols,
                g.record_byte_len().unwrap_or_default(),
                self.cursor()
            ),
            None => "Dataset: not loaded".to_string(),
        }
    }
}

/// Parse both headers and check that the payloads cover every record
fn validate(
    images: RawArchive,
    labels: RawArchive,
    check_counts: bool,
) -> std::result::Result<Records, FormatError> {
    let geometry = read_image_header(images.as_bytes())?;
    let label_count = read_label_header(labels.as_bytes())?;

    if check_counts && label_count != geometry.record_count {
        return Err(FormatError::CountMismatch {
            images: geometry.record_count,
            labels: label_count,
        });
    }

    let overflow = FormatError::GeometryOverflow {
        record_count: geometry.record_count,
        rows: geometry.rows,
        cols: geometry.cols,
    };
    let (Some(record_len), Some(expected)) =
        (geometry.record_byte_len(), geometry.image_archive_len())
    else {
        return Err(overflow);
    };
    if images.len() < expected {
        return Err(FormatError::Truncated {
            kind: ArchiveKind::Images,
            size: images.len(),
            expected,
        });
    }

    let expected = usize::try_from(geometry.record_count)
        .ok()
        .and_then(|count| count.checked_add(ArchiveKind::Labels.header_size()))
        .ok_or(overflow)?;
    if labels.len() < expected {
        return Err(FormatError::Truncated {
            kind: ArchiveKind::Labels,
            size: labels.len(),
            expected,
        });
    }

    Ok(Records::new(images, labels, geometry, record_len))
}
