//! TCP transport
//!
//! Frames are written directly to the socket. Reads happen on a background
//! task that decodes frames and forwards them over an mpsc channel, which
//! keeps `next()` cancel-safe.

use crate::error::TransportError;
use crate::transport::Link;
use crate::transport::codec::{encode, read_frame};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Link over a TCP socket using length-prefixed bincode frames
pub struct TcpLink<Out, In> {
    writer: Option<OwnedWriteHalf>,
    rx: mpsc::Receiver<Result<In, TransportError>>,
    reader: JoinHandle<()>,
    peer: SocketAddr,
    _out: PhantomData<fn(Out)>,
}

impl<Out, In> TcpLink<Out, In>
where
    Out: Serialize + Send + 'static,
    In: DeserializeOwned + Send + 'static,
{
    /// Connect to `host:port`
    pub async fn connect(host: &str, port: u16, capacity: usize) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| TransportError::Connection(format!("{}:{}: {}", host, port, e)))?;
        Self::from_stream(stream, capacity)
    }

    /// Wrap an accepted or connected stream
    pub fn from_stream(stream: TcpStream, capacity: usize) -> Result<Self, TransportError> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let (mut read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let reader = tokio::spawn(async move {
            loop {
                match read_frame::<_, In>(&mut read_half).await {
                    Ok(Some(msg)) => {
                        if tx.send(Ok(msg)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("Peer {} closed the connection", peer);
                        break;
                    }
                    Err(e) => {
                        warn!("Dropping connection to {}: {}", peer, e);
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        });

        Ok(Self {
            writer: Some(write_half),
            rx,
            reader,
            peer,
            _out: PhantomData,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl<Out, In> Link<Out, In> for TcpLink<Out, In>
where
    Out: Serialize + Send + 'static,
    In: DeserializeOwned + Send + 'static,
{
    async fn send(&mut self, msg: Out) -> Result<(), TransportError> {
        let frame = encode(&msg)?;
        let writer = self.writer.as_mut().ok_or(TransportError::ChannelClosed)?;
        writer.write_all(&frame).await?;
        Ok(())
    }

    async fn next(&mut self) -> Result<In, TransportError> {
        match self.rx.recv().await {
            Some(result) => result,
            None => Err(TransportError::ChannelClosed),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Shutdown of connection to {} failed: {}", self.peer, e);
            }
        }
        self.reader.abort();
        self.rx.close();
        Ok(())
    }
}

impl<Out, In> Drop for TcpLink<Out, In> {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
