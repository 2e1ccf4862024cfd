//! Line transport abstractions
//!
//! Provides the `Transport` trait the client drives, and `LineChannel`, which
//! frames newline-terminated messages over any async reader/writer pair.

use async_trait::async_trait;
use cgt_core::{CgtError, DEFAULT_MAX_LINE_BYTES, Result};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// One request/response channel to an engine
#[async_trait]
pub trait Transport: Send {
    /// Write `line` plus a single `\n` and flush
    async fn send_line(&mut self, line: &[u8]) -> Result<()>;

    /// Wait for one complete line, returned without its terminator
    async fn receive_line(&mut self) -> Result<Vec<u8>>;

    /// End the session. Later sends fail with a write error.
    async fn close(&mut self) -> Result<()>;
}

/// Newline framing over an async reader/writer pair
pub struct LineChannel<R, W> {
    reader: BufReader<R>,
    /// `None` once closed
    writer: Option<W>,
    read_timeout: Option<Duration>,
    max_line_bytes: usize,
}

impl<R, W> LineChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a channel without a read timeout
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: Some(writer),
            read_timeout: None,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Set the read timeout and the longest accepted line
    pub fn with_limits(mut self, read_timeout: Option<Duration>, max_line_bytes: usize) -> Self {
        self.read_timeout = read_timeout;
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    async fn read_line_unbounded(&mut self) -> Result<Vec<u8>> {
        // One extra byte for the terminator
        let limit = self.max_line_bytes as u64 + 1;
        let mut line = Vec::new();
        let bytes_read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut line)
            .await
            .map_err(|e| CgtError::Read(format!("Read failed: {}", e)))?;

        if bytes_read == 0 {
            return Err(CgtError::Read(
                "engine closed its output without responding".into(),
            ));
        }

        if line.last() != Some(&b'\n') {
            if line.len() as u64 >= limit {
                return Err(CgtError::Protocol(format!(
                    "response line exceeds {} bytes",
                    self.max_line_bytes
                )));
            }
            return Err(CgtError::Protocol(format!(
                "response truncated: {} bytes without a line terminator",
                line.len()
            )));
        }

        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(line)
    }
}

#[async_trait]
impl<R, W> Transport for LineChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send_line(&mut self, line: &[u8]) -> Result<()> {
        if line.contains(&b'\n') {
            return Err(CgtError::Encoding(
                "message contains a raw newline and cannot be framed".into(),
            ));
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CgtError::Write("input channel is closed".into()))?;

        writer
            .write_all(line)
            .await
            .map_err(|e| CgtError::Write(format!("Write failed: {}", e)))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| CgtError::Write(format!("Write newline failed: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| CgtError::Write(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    async fn receive_line(&mut self) -> Result<Vec<u8>> {
        match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_line_unbounded())
                .await
                .map_err(|_| CgtError::Timeout(limit))?,
            None => self.read_line_unbounded().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            // Peer may already be gone; dropping the writer is what matters
            if let Err(e) = writer.shutdown().await {
                debug!("Shutdown of input channel failed: {}", e);
            }
        }
        Ok(())
    }
}
