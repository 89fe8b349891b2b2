//! IDX header parsing
//!
//! An IDX file starts with a fixed header of big-endian u32 fields:
//!
//! - image archive (idx3): magic, record count, rows, cols (16 bytes)
//! - label archive (idx1): magic, record count (8 bytes)
//!
//! followed by one byte per pixel (images) or per label.

use super::archive::ArchiveKind;
use crate::utils::FormatError;

/// Magic number of an idx3 image archive (unsigned byte, 3 dimensions)
pub const IMAGE_MAGIC: u32 = 0x0000_0803;

/// Magic number of an idx1 label archive (unsigned byte, 1 dimension)
pub const LABEL_MAGIC: u32 = 0x0000_0801;

/// Image header size in bytes
pub const IMAGE_HEADER_SIZE: usize = 16;

/// Label header size in bytes
pub const LABEL_HEADER_SIZE: usize = 8;

/// Record geometry recovered from the image archive header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub record_count: u32,
    pub rows: u32,
    pub cols: u32,
}

impl Geometry {
    /// Bytes per image record (one byte per pixel), `None` on overflow
    #[inline]
    pub fn record_byte_len(&self) -> Option<usize> {
        usize::try_from(self.rows)
            .ok()?
            .checked_mul(usize::try_from(self.cols).ok()?)
    }

    /// Total archive size implied by this geometry, header included
    ///
    /// Header fields are untrusted; `None` if the size does not fit in `usize`.
    pub fn image_archive_len(&self) -> Option<usize> {
        usize::try_from(self.record_count)
            .ok()?
            .checked_mul(self.record_byte_len()?)?
            .checked_add(IMAGE_HEADER_SIZE)
    }
}

/// Read a big-endian u32 at `offset`, most significant byte first
///
/// Returns `None` if fewer than four bytes are available.
pub fn read_u32_be(buffer: &[u8], offset: usize) -> Option<u32> {
    let bytes = buffer.get(offset..offset.checked_add(4)?)?;
    Some(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
}

fn check_magic(buffer: &[u8], kind: ArchiveKind) -> Result<(), FormatError> {
    let minimum = kind.header_size();
    if buffer.len() < minimum {
        return Err(FormatError::TooShort {
            kind,
            size: buffer.len(),
            minimum,
        });
    }

    let actual = read_u32_be(buffer, 0).unwrap_or_default();
    if actual != kind.magic() {
        return Err(FormatError::InvalidMagic {
            kind,
            expected: kind.magic(),
            actual,
        });
    }
    Ok(())
}

/// Parse the 16-byte image header into a [`Geometry`]
pub fn read_image_header(buffer: &[u8]) -> Result<Geometry, FormatError> {
    check_magic(buffer, ArchiveKind::Images)?;

    // Length checked above, the fields are present
    let record_count = read_u32_be(buffer, 4).unwrap_or_default();
    let rows = read_u32_be(buffer, 8).unwrap_or_default();
    let cols = read_u32_be(buffer, 12).unwrap_or_default();

    if record_count == 0 {
        return Err(FormatError::EmptyArchive {
            kind: ArchiveKind::Images,
        });
    }
    if rows == 0 || cols == 0 {
        return Err(FormatError::ZeroDimension { rows, cols });
    }

    Ok(Geometry {
        record_count,
        rows,
        cols,
    })
}

/// Parse the 8-byte label header, returning the record count
pub fn read_label_header(buffer: &[u8]) -> Result<u32, FormatError> {
    check_magic(buffer, ArchiveKind::Labels)?;

    let record_count = read_u32_be(buffer, 4).unwrap_or_default();
    if record_count == 0 {
        return Err(FormatError::EmptyArchive {
            kind: ArchiveKind::Labels,
        });
    }
    Ok(record_count)
}
