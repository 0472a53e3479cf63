//! Response accumulation.
//!
//! The transport hands response bytes over as they arrive; a
//! [`ResponseBuffer`] collects them into one contiguous, owned buffer whose
//! final size is not known up front.

use crate::error::{EstError, Result};

/// Destination for a streamed response body.
///
/// The transport calls [`write_chunk`](ResponseSink::write_chunk) once per
/// received chunk, in wire order. An error aborts the transfer.
pub trait ResponseSink: Send {
    /// Accept the next chunk of the response body.
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()>;
}

/// Growable byte buffer for a single EST response.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    data: Vec<u8>,
    limit: Option<usize>,
}

impl ResponseBuffer {
    /// Create an empty buffer with no size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Append a chunk to the end of the buffer.
    ///
    /// Either the whole chunk is appended or the buffer is left exactly as it
    /// was and [`EstError::OutOfMemory`] is returned.
    pub fn append(&mut self, chunk: &[u8]) -> Result<()> {
        let buffered = self.data.len();
        let oom = || EstError::out_of_memory(chunk.len(), buffered);

        let wanted = buffered.checked_add(chunk.len()).ok_or_else(oom)?;
        if self.limit.is_some_and(|limit| wanted > limit) {
            return Err(oom());
        }

        if wanted > self.data.capacity() {
            // geometric growth, never reserving past the ceiling
            let target = self.data.capacity().saturating_mul(2).max(wanted);
            let target = self.limit.map_or(target, |limit| target.min(limit));
            self.data
                .try_reserve_exact(target - buffered)
                .map_err(|_| oom())?;
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Buffered bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return exactly the bytes written.
    pub fn finalize(self) -> Vec<u8> {
        self.data
    }
}

impl ResponseSink for ResponseBuffer {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.append(chunk)
    }
}
