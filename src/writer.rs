//! Outbound side of a session.
//!
//! Everything the session writes goes through [`SessionWriter`]: script
//! lines (IAC-escaped, newline-terminated) and raw negotiation replies from
//! the codec. Each write is flushed before returning so the remote sees the
//! answer before we start waiting for its next prompt.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::codec::escape_data;

/// Line-oriented writer over the write half of a session stream.
#[derive(Debug)]
pub struct SessionWriter<W> {
    inner: W,
    bytes_written: usize,
}

impl<W: AsyncWrite + Unpin> SessionWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Send one script line; a `\n` terminator is appended.
    pub async fn send_line(&mut self, line: &str) -> io::Result<()> {
        tracing::debug!("Sending {:?}", line);
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.write(&escape_data(&data)).await
    }

    /// Send bytes that are already telnet-encoded (negotiation replies).
    pub async fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        tracing::trace!("Sending {} negotiation bytes", bytes.len());
        self.write(bytes).await
    }

    /// Shut down the write direction.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }

    /// Total bytes written so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        self.bytes_written += bytes.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::command::IAC;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_send_line_appends_newline() {
        let (client, mut server) = duplex(4096);
        let mut writer = SessionWriter::new(client);

        writer.send_line("399").await.unwrap();

        let mut buf = vec![0u8; 64];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"399\n");
        assert_eq!(writer.bytes_written(), 4);
    }

    #[tokio::test]
    async fn test_raw_reply_then_line_keep_order() {
        let (client, mut server) = duplex(4096);
        let mut writer = SessionWriter::new(client);

        writer.send_raw(&[IAC, 251, 1]).await.unwrap();
        writer.send_line("e").await.unwrap();

        let mut buf = vec![0u8; 64];
        let mut total = 0;
        while total < 5 {
            total += server.read(&mut buf[total..]).await.unwrap();
        }
        assert_eq!(&buf[..total], &[IAC, 251, 1, b'e', b'\n']);
    }

    #[tokio::test]
    async fn test_empty_raw_is_noop() {
        let (client, _server) = duplex(64);
        let mut writer = SessionWriter::new(client);

        writer.send_raw(&[]).await.unwrap();
        assert_eq!(writer.bytes_written(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_signals_eof() {
        let (client, mut server) = duplex(64);
        let mut writer = SessionWriter::new(client);

        writer.shutdown().await.unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(server.read(&mut buf).await.unwrap(), 0);
    }
}
