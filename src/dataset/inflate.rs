//! Stream decompression
//!
//! Drains a [`ChunkSource`] into one fully materialized [`RawArchive`].
//! Chunks are pushed into an incremental decoder in arrival order, so the
//! compressed size never needs to be known up front.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use flate2::write::GzDecoder;
use tracing::debug;

use super::archive::{ArchiveKind, RawArchive};
use super::source::ChunkSource;
use crate::utils::{DecodeError, LoaderError};

/// First two bytes of every gzip member
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Content encoding of a chunk stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Sniff the gzip magic and fall back to identity
    #[default]
    Auto,
    Gzip,
    Identity,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Auto => "auto",
            Encoding::Gzip => "gzip",
            Encoding::Identity => "identity",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Encoding::Auto),
            "gzip" | "gz" => Ok(Encoding::Gzip),
            "identity" | "none" | "raw" => Ok(Encoding::Identity),
            other => Err(format!("Unknown encoding: {}", other)),
        }
    }
}

enum Sink {
    /// Auto mode, waiting for enough bytes to sniff the magic
    Pending(Vec<u8>),
    Gzip(GzDecoder<Vec<u8>>),
    Identity(Vec<u8>),
}

/// Push-style incremental decoder
pub struct Inflater {
    sink: Sink,
    compressed_len: usize,
    chunks: usize,
}

impl Inflater {
    pub fn new(encoding: Encoding) -> Self {
        let sink = match encoding {
            Encoding::Auto => Sink::Pending(Vec::with_capacity(GZIP_MAGIC.len())),
            Encoding::Gzip => Sink::Gzip(GzDecoder::new(Vec::new())),
            Encoding::Identity => Sink::Identity(Vec::new()),
        };
        Self {
            sink,
            compressed_len: 0,
            chunks: 0,
        }
    }

    /// Feed one chunk
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        self.compressed_len += chunk.len();
        self.chunks += 1;

        if let Sink::Pending(prefix) = &mut self.sink {
            prefix.extend_from_slice(chunk);
            if prefix.len() < GZIP_MAGIC.len() {
                return Ok(());
            }
            let prefix = std::mem::take(prefix);
            self.sink = Self::sniff(&prefix);
            return self.write(&prefix);
        }

        self.write(chunk)
    }

    /// Signal end of stream and take the decompressed bytes
    pub fn finish(self) -> Result<Vec<u8>, DecodeError> {
        match self.sink {
            // Fewer than two bytes in total, cannot be gzip
            Sink::Pending(prefix) => Ok(prefix),
            Sink::Identity(out) => Ok(out),
            Sink::Gzip(decoder) => decoder.finish().map_err(finish_error),
        }
    }

    /// Compressed bytes consumed so far
    pub fn compressed_len(&self) -> usize {
        self.compressed_len
    }

    /// Chunks consumed so far
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    fn sniff(prefix: &[u8]) -> Sink {
        if prefix.starts_with(&GZIP_MAGIC) {
            Sink::Gzip(GzDecoder::new(Vec::new()))
        } else {
            Sink::Identity(Vec::new())
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        match &mut self.sink {
            Sink::Pending(prefix) => prefix.extend_from_slice(bytes),
            Sink::Identity(out) => out.extend_from_slice(bytes),
            Sink::Gzip(decoder) => decoder
                .write_all(bytes)
                .map_err(|e| DecodeError::Malformed(e.to_string()))?,
        }
        Ok(())
    }
}

fn finish_error(err: io::Error) -> DecodeError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::Truncated,
        _ => DecodeError::Malformed(err.to_string()),
    }
}

/// Drain `source` and decompress it into a [`RawArchive`]
pub async fn inflate<S>(
    source: &mut S,
    kind: ArchiveKind,
    encoding: Encoding,
) -> Result<RawArchive, LoaderError>
where
    S: ChunkSource + ?Sized,
{
    let mut inflater = Inflater::new(encoding);

    while let Some(chunk) = source.next_chunk().await? {
        inflater.push(&chunk)?;
    }

    let compressed_len = inflater.compressed_len();
    let chunks = inflater.chunks();
    let bytes = inflater.finish()?;

    debug!(
        "Inflated {} archive: {} chunks, {} -> {} bytes",
        kind,
        chunks,
        compressed_len,
        bytes.len()
    );

    Ok(RawArchive::new(kind, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::source::MemorySource;
    use crate::utils::TransportError;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn payload() -> Vec<u8> {
        (0..5000u32).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_encoding_parse() {
        assert_eq!("gz".parse::<Encoding>().unwrap(), Encoding::Gzip);
        assert_eq!("Identity".parse::<Encoding>().unwrap(), Encoding::Identity);
        assert_eq!("auto".parse::<Encoding>().unwrap(), Encoding::Auto);
        assert!("zstd".parse::<Encoding>().is_err());
    }

    #[tokio::test]
    async fn test_inflate_gzip_any_chunking() {
        let data = payload();
        let compressed = gzip(&data);

        for chunk_size in [1, 7, 512, compressed.len()] {
            let mut source = MemorySource::chunked(&compressed, chunk_size);
            let archive = inflate(&mut source, ArchiveKind::Images, Encoding::Gzip)
                .await
                .unwrap();
            assert_eq!(archive.as_bytes(), &data[..], "chunk size {}", chunk_size);
            assert_eq!(archive.kind(), ArchiveKind::Images);
        }
    }

    #[tokio::test]
    async fn test_inflate_auto_detects_gzip() {
        let data = payload();
        let mut source = MemorySource::chunked(&gzip(&data), 1);
        let archive = inflate(&mut source, ArchiveKind::Labels, Encoding::Auto)
            .await
            .unwrap();
        assert_eq!(archive.as_bytes(), &data[..]);
    }

    #[tokio::test]
    async fn test_inflate_auto_passes_through_raw() {
        let data = vec![0u8, 0, 8, 1, 0, 0, 0, 1, 5];
        let mut source = MemorySource::chunked(&data, 1);
        let archive = inflate(&mut source, ArchiveKind::Labels, Encoding::Auto)
            .await
            .unwrap();
        assert_eq!(archive.as_bytes(), &data[..]);
    }

    #[tokio::test]
    async fn test_inflate_empty_stream() {
        let mut source = MemorySource::default();
        let archive = inflate(&mut source, ArchiveKind::Images, Encoding::Auto)
            .await
            .unwrap();
        assert!(archive.is_empty());
    }

    #[tokio::test]
    async fn test_inflate_malformed_gzip() {
        let mut source = MemorySource::new(vec![b"definitely not gzip data".to_vec()]);
        let err = inflate(&mut source, ArchiveKind::Images, Encoding::Gzip)
            .await
            .unwrap_err();
        assert!(matches!(err, LoaderError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_inflate_truncated_gzip() {
        let compressed = gzip(&payload());
        let cut = &compressed[..compressed.len() / 2];
        let mut source = MemorySource::chunked(cut, 64);
        let err = inflate(&mut source, ArchiveKind::Images, Encoding::Gzip)
            .await
            .unwrap_err();
        assert!(matches!(err, LoaderError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_inflate_transport_failure() {
        let compressed = gzip(&payload());
        let mut source = MemorySource::failing_after(vec![compressed[..10].to_vec()], "reset");
        let err = inflate(&mut source, ArchiveKind::Images, Encoding::Gzip)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Transport(TransportError::Unavailable(_))
        ));
    }
}
