//! Length-prefixed TCP feed client
//!
//! Each frame is a fixed-width ASCII decimal length, zero-padded on the
//! left, followed by that many payload bytes of UTF-8 JSON.

use eyre::{Result, WrapErr};
use std::io::ErrorKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::info;

/// Width of the length prefix in bytes.
pub const LENGTH_PREFIX_BYTES: usize = 16;

pub struct FeedClient {
    stream: TcpStream,
}

impl FeedClient {
    /// Connection failure here is fatal to the process.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .wrap_err_with(|| format!("connecting to feed at {host}:{port}"))?;
        info!("connected to feed at {host}:{port}");
        Ok(Self { stream })
    }

    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Reads one frame. `Ok(None)` on a clean EOF at a frame boundary;
    /// a short read mid-frame is an error.
    pub async fn recv(&mut self) -> Result<Option<String>> {
        let mut prefix = [0u8; LENGTH_PREFIX_BYTES];
        match self.stream.read_exact(&mut prefix).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e).wrap_err("reading frame length"),
        }

        let text = std::str::from_utf8(&prefix).wrap_err("length prefix is not ASCII")?;
        let length: usize = text
            .trim()
            .parse()
            .wrap_err_with(|| format!("bad length prefix {text:?}"))?;

        let mut payload = vec![0u8; length];
        self.stream
            .read_exact(&mut payload)
            .await
            .wrap_err("reading frame payload")?;
        Ok(Some(
            String::from_utf8(payload).wrap_err("frame payload is not UTF-8")?,
        ))
    }

    /// Writes one frame with the same framing the upstream uses.
    pub async fn send(&mut self, message: &str) -> Result<()> {
        let prefix = format!("{:0>width$}", message.len(), width = LENGTH_PREFIX_BYTES);
        self.stream.write_all(prefix.as_bytes()).await?;
        self.stream.write_all(message.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn frames_round_trip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut peer = FeedClient::new(stream);
            let first = peer.recv().await.unwrap().unwrap();
            peer.send(&first).await.unwrap();
            peer.send("{\"base\":\"BTC\"}").await.unwrap();
        });

        let mut client = FeedClient::connect("127.0.0.1", addr.port()).await.unwrap();
        let payload = r#"{"base":"BTC","quote":"USDT","exchange":"Binance","price":67123.4}"#;
        client.send(payload).await.unwrap();

        assert_eq!(client.recv().await.unwrap().as_deref(), Some(payload));
        assert_eq!(client.recv().await.unwrap().as_deref(), Some("{\"base\":\"BTC\"}"));

        // Server hangs up: clean EOF, not an error.
        server.await.unwrap();
        assert!(client.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prefix_is_sixteen_zero_padded_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = vec![0u8; LENGTH_PREFIX_BYTES + 2];
            stream.read_exact(&mut raw).await.unwrap();
            raw
        });

        let mut client = FeedClient::connect("127.0.0.1", addr.port()).await.unwrap();
        client.send("{}").await.unwrap();

        let raw = server.await.unwrap();
        assert_eq!(&raw[..LENGTH_PREFIX_BYTES], b"0000000000000002");
        assert_eq!(&raw[LENGTH_PREFIX_BYTES..], b"{}");
    }
}
