//! Decompressed IDX archives

use std::fmt;

use super::header::{IMAGE_HEADER_SIZE, IMAGE_MAGIC, LABEL_HEADER_SIZE, LABEL_MAGIC};

/// Which of the two IDX files an archive holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Images,
    Labels,
}

impl ArchiveKind {
    /// Expected magic number
    pub fn magic(&self) -> u32 {
        match self {
            ArchiveKind::Images => IMAGE_MAGIC,
            ArchiveKind::Labels => LABEL_MAGIC,
        }
    }

    /// Header size in bytes
    pub fn header_size(&self) -> usize {
        match self {
            ArchiveKind::Images => IMAGE_HEADER_SIZE,
            ArchiveKind::Labels => LABEL_HEADER_SIZE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Images => "images",
            ArchiveKind::Labels => "labels",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully decompressed IDX file
///
/// Immutable once built; the sampler slices records straight out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArchive {
    kind: ArchiveKind,
    bytes: Vec<u8>,
}

impl RawArchive {
    pub fn new(kind: ArchiveKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }

    #[inline]
    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes of record `idx`, each record being `record_len` bytes after the header
    ///
    /// Returns `None` if the record lies outside the buffer.
    #[inline]
    pub fn record(&self, idx: u64, record_len: usize) -> Option<&[u8]> {
        let start = usize::try_from(idx)
            .ok()?
            .checked_mul(record_len)?
            .checked_add(self.kind.header_size())?;
        self.bytes.get(start..start.checked_add(record_len)?)
    }

    /// Bytes of record `idx` (zero-copy, no bounds recovery)
    ///
    /// # Panics
    /// Panics if the record lies outside the buffer; callers validate the
    /// archive length against the record count first.
    #[inline(always)]
    pub fn record_at(&self, idx: usize, record_len: usize) -> &[u8] {
        let offset = self.kind.header_size() + idx * record_len;
        debug_assert!(offset + record_len <= self.bytes.len(), "record index out of bounds");
        &self.bytes[offset..offset + record_len]
    }
}
