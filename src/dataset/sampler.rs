//! Cyclic batch sampling
//!
//! Records are addressed by logical index `(cursor + i) mod record_count`,
//! so batch production never runs out: after the last record the sampler
//! continues from record 0 without signalling an epoch boundary.

use ndarray::{s, Array2, Array4};

use super::archive::RawArchive;
use super::header::Geometry;

/// Divisor mapping a pixel byte onto [0, 1]
pub const NORMALIZE_DIVISOR: f32 = 255.0;

/// Number of label classes used for one-hot encoding
pub const NUM_CLASSES: usize = 10;

/// Map a raw pixel byte to [0, 1]
#[inline(always)]
pub fn normalize(byte: u8) -> f32 {
    f32::from(byte) / NORMALIZE_DIVISOR
}

/// Logical record index of the `i`-th entry of a batch starting at `start`
#[inline(always)]
pub fn record_index(start: u64, i: u64, record_count: u64) -> u64 {
    debug_assert!(record_count > 0);
    ((u128::from(start) + u128::from(i)) % u128::from(record_count)) as u64
}

/// Cursor position after serving `size` records from `cursor`
#[inline(always)]
pub fn advance(cursor: u64, size: u32, record_count: u64) -> u64 {
    record_index(cursor, u64::from(size), record_count)
}

/// One labeled, normalized sample
#[derive(Debug, Clone, PartialEq)]
pub struct SampleEntry {
    /// Logical record index
    pub index: u64,
    /// Raw label byte (0-9 for MNIST)
    pub label: u8,
    /// Row-major `rows x cols` grid of values in [0, 1]
    pub pixels: Array2<f32>,
}

impl SampleEntry {
    pub fn rows(&self) -> usize {
        self.pixels.nrows()
    }

    pub fn cols(&self) -> usize {
        self.pixels.ncols()
    }

    /// Average pixel value, 0.0 for an empty grid
    pub fn mean_intensity(&self) -> f32 {
        self.pixels.mean().unwrap_or(0.0)
    }

    /// One-hot encoding of the label; all zeros if the label is out of range
    pub fn one_hot(&self) -> [f32; NUM_CLASSES] {
        let mut out = [0.0; NUM_CLASSES];
        if let Some(slot) = out.get_mut(self.label as usize) {
            *slot = 1.0;
        }
        out
    }
}

/// A batch stacked into dense tensors
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Images, shape `[n, rows, cols, 1]`
    pub xs: Array4<f32>,
    /// One-hot labels, shape `[n, 10]`
    pub ys: Array2<f32>,
}

impl Batch {
    /// Stack entries of a `rows x cols` dataset
    ///
    /// Entries with a different grid shape are left as zeros.
    pub fn stack(entries: &[SampleEntry], rows: usize, cols: usize) -> Self {
        let n = entries.len();
        let mut xs = Array4::<f32>::zeros((n, rows, cols, 1));
        let mut ys = Array2::<f32>::zeros((n, NUM_CLASSES));

        for (i, entry) in entries.iter().enumerate() {
            if entry.pixels.dim() == (rows, cols) {
                xs.slice_mut(s![i, .., .., 0]).assign(&entry.pixels);
            }
            for (slot, value) in ys.row_mut(i).iter_mut().zip(entry.one_hot()) {
                *slot = value;
            }
        }

        Self { xs, ys }
    }

    pub fn len(&self) -> usize {
        self.xs.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Both archives of a loaded dataset plus the geometry they were validated against
#[derive(Debug)]
pub(crate) struct Records {
    pub(crate) images: RawArchive,
    pub(crate) labels: RawArchive,
    pub(crate) geometry: Geometry,
    record_len: usize,
}

impl Records {
    /// `images` and `labels` must hold every record of `geometry`,
    /// each image being `record_len` bytes
    pub(crate) fn new(
        images: RawArchive,
        labels: RawArchive,
        geometry: Geometry,
        record_len: usize,
    ) -> Self {
        Self {
            images,
            labels,
            geometry,
            record_len,
        }
    }

    #[inline]
    pub(crate) fn record_count(&self) -> u64 {
        u64::from(self.geometry.record_count)
    }

    /// Build the entry for logical index `idx`, `None` if out of range
    pub(crate) fn entry(&self, idx: u64) -> Option<SampleEntry> {
        if idx >= self.record_count() {
            return None;
        }
        Some(self.entry_at(idx))
    }

    /// Build the entry for an in-range logical index
    fn entry_at(&self, idx: u64) -> SampleEntry {
        debug_assert!(idx < self.record_count());
        // idx < record_count, and header + record_count * record_len fits in usize
        let pos = idx as usize;
        let label = self.labels.record_at(pos, 1)[0];
        let bytes = self.images.record_at(pos, self.record_len);
        let cols = self.geometry.cols as usize;
        let shape = (self.geometry.rows as usize, cols);
        let pixels = Array2::from_shape_fn(shape, |(r, c)| normalize(bytes[r * cols + c]));

        SampleEntry {
            index: idx,
            label,
            pixels,
        }
    }

    /// Entries for `size` consecutive logical indices starting at `start`
    pub(crate) fn sample(&self, start: u64, size: u32) -> Vec<SampleEntry> {
        let count = self.record_count();
        (0..u64::from(size))
            .map(|i| self.entry_at(record_index(start, i, count)))
            .collect()
    }
}
