//! Duplex channel
//!
//! Thin wrapper over any ordered byte stream (a `TcpStream`, or an in-memory
//! `tokio::io::duplex` pipe in tests). The only guarantee it adds is the
//! exact-count read every frame relies on: `read_exact(n)` returns exactly
//! `n` bytes or fails with `ConnectionClosed`.
//!
//! The channel can be split into a reader and a writer half so a connection
//! can read and write concurrently. Both halves share one open flag; once
//! either side observes the peer going away, `is_open` reports false on both.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::utils::{BrokerError, Result};

pub struct DuplexChannel<S> {
    reader: ChannelReader<ReadHalf<S>>,
    writer: ChannelWriter<WriteHalf<S>>,
}

impl<S> DuplexChannel<S>
where
    S: AsyncRead + AsyncWrite,
{
    pub fn new(stream: S) -> Self {
        let open = Arc::new(AtomicBool::new(true));
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: ChannelReader {
                inner: read_half,
                open: open.clone(),
            },
            writer: ChannelWriter {
                inner: write_half,
                open,
            },
        }
    }

    pub fn split(self) -> (ChannelReader<ReadHalf<S>>, ChannelWriter<WriteHalf<S>>) {
        (self.reader, self.writer)
    }

    pub async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        self.reader.read_exact(n).await
    }

    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write(bytes).await
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_open()
    }

    pub async fn close(&mut self) {
        self.writer.close().await;
    }
}

/// Read half of a [`DuplexChannel`].
pub struct ChannelReader<R> {
    inner: R,
    open: Arc<AtomicBool>,
}

impl<R> ChannelReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Block until exactly `n` bytes have been read.
    pub async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        if !self.is_open() {
            return Err(BrokerError::ConnectionClosed);
        }
        let mut buf = vec![0u8; n];
        match self.inner.read_exact(&mut buf).await {
            Ok(_) => Ok(buf),
            Err(err) => {
                self.open.store(false, Ordering::SeqCst);
                Err(err.into())
            }
        }
    }

    /// Read until `n` bytes have arrived or the stream ends. The result is
    /// shorter than `n` only when the peer closed.
    pub async fn read_up_to(&mut self, n: usize) -> Result<Vec<u8>> {
        if !self.is_open() {
            return Err(BrokerError::ConnectionClosed);
        }
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match self.inner.read(&mut buf[filled..]).await {
                Ok(0) => {
                    self.open.store(false, Ordering::SeqCst);
                    break;
                }
                Ok(read) => filled += read,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => {
                    self.open.store(false, Ordering::SeqCst);
                    return Err(err.into());
                }
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Write half of a [`DuplexChannel`].
pub struct ChannelWriter<W> {
    inner: W,
    open: Arc<AtomicBool>,
}

impl<W> ChannelWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Write all of `bytes` and flush. Fails with `ConnectionClosed` once the
    /// peer is gone.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.is_open() {
            return Err(BrokerError::ConnectionClosed);
        }
        let result: std::io::Result<()> = async {
            self.inner.write_all(bytes).await?;
            self.inner.flush().await
        }
        .await;

        result.map_err(|err| {
            self.open.store(false, Ordering::SeqCst);
            err.into()
        })
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Shut down the write side. Further reads and writes on either half
    /// fail with `ConnectionClosed`.
    pub async fn close(&mut self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.inner.shutdown().await;
        }
    }
}
