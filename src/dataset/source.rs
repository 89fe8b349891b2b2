//! Byte-chunk sources feeding the decompressor
//!
//! A source hands out chunks of compressed bytes until it is exhausted.
//! Nothing here knows the total length up front:
//! - [`ReaderSource`] pulls fixed-size reads from any async reader (file, socket)
//! - [`MemorySource`] replays pre-split chunks, optionally ending in a failure

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::utils::TransportError;

/// Default read size for [`ReaderSource`]
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Pull-based source of byte chunks
///
/// `Ok(None)` is the end-of-stream sentinel. After it, or after an error,
/// the source must not be polled again.
#[async_trait]
pub trait ChunkSource: Send {
    /// Pull the next chunk
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

#[async_trait]
impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).next_chunk().await
    }
}

/// Chunk source over an async reader
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    chunk_size: usize,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// A zero `chunk_size` is bumped to 1
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl ReaderSource<tokio::fs::File> {
    /// Open a file as a chunk source
    pub async fn open<P: AsRef<std::path::Path>>(
        path: P,
        chunk_size: usize,
    ) -> Result<Self, TransportError> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        Ok(Self::with_chunk_size(file, chunk_size))
    }
}

#[async_trait]
impl<R> ChunkSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut chunk = vec![0u8; self.chunk_size];
        let n = self.reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        chunk.truncate(n);
        Ok(Some(chunk))
    }
}

/// In-memory chunk source
#[derive(Debug, Default)]
pub struct MemorySource {
    chunks: VecDeque<Vec<u8>>,
    failure: Option<String>,
}

impl MemorySource {
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().collect(),
            failure: None,
        }
    }

    /// Split `bytes` into chunks of at most `chunk_size` bytes
    pub fn chunked(bytes: &[u8], chunk_size: usize) -> Self {
        Self::new(bytes.chunks(chunk_size.max(1)).map(<[u8]>::to_vec))
    }

    /// Serve `chunks`, then fail instead of signalling end of stream
    pub fn failing_after<I>(chunks: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().collect(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl ChunkSource for MemorySource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        match self.failure.take() {
            Some(message) => Err(TransportError::Unavailable(message)),
            None => Ok(None),
        }
    }
}
