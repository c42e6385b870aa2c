//! Tokio channel-based transport for single-process mode
//!
//! No serialization overhead - messages are passed directly.

use crate::error::TransportError;
use crate::transport::Link;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::mpsc;

/// Default capacity of each direction of a channel link
pub const DEFAULT_CAPACITY: usize = 1000;

/// In-process link backed by a pair of mpsc channels
pub struct ChannelLink<Out, In> {
    tx: Option<mpsc::Sender<Out>>,
    rx: mpsc::Receiver<In>,
}

impl<Out, In> ChannelLink<Out, In>
where
    Out: Send + 'static,
    In: Send + 'static,
{
    /// Create both ends of a link with the given per-direction capacity
    pub fn pair(capacity: usize) -> (Self, ChannelLink<In, Out>) {
        let (out_tx, out_rx) = mpsc::channel(capacity);
        let (in_tx, in_rx) = mpsc::channel(capacity);
        (
            Self {
                tx: Some(out_tx),
                rx: in_rx,
            },
            ChannelLink {
                tx: Some(in_tx),
                rx: out_rx,
            },
        )
    }
}

#[async_trait]
impl<Out, In> Link<Out, In> for ChannelLink<Out, In>
where
    Out: Serialize + Send + 'static,
    In: DeserializeOwned + Send + 'static,
{
    async fn send(&mut self, msg: Out) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::ChannelClosed)?;
        tx.send(msg).await.map_err(|_| TransportError::ChannelClosed)
    }

    async fn next(&mut self) -> Result<In, TransportError> {
        self.rx.recv().await.ok_or(TransportError::ChannelClosed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // Dropping the sender lets the other end observe the close
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let (mut client, mut server) = ChannelLink::<String, u32>::pair(10);

        client.send("hello".to_string()).await.unwrap();
        assert_eq!(server.next().await.unwrap(), "hello");

        server.send(42).await.unwrap();
        assert_eq!(client.next().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_close_is_observed() {
        let (mut client, mut server) = ChannelLink::<String, u32>::pair(10);

        client.close().await.unwrap();
        assert!(matches!(
            server.next().await,
            Err(TransportError::ChannelClosed)
        ));
        assert!(matches!(
            client.send("late".to_string()).await,
            Err(TransportError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_preserves_order() {
        let (mut client, mut server) = ChannelLink::<u32, u32>::pair(10);
        for i in 0..5 {
            client.send(i).await.unwrap();
        }
        for i in 0..5 {
            assert_eq!(server.next().await.unwrap(), i);
        }
    }
}
