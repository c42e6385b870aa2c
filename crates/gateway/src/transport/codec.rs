//! Length-prefixed bincode framing
//!
//! Each frame is a big-endian `u32` payload length followed by the bincode
//! encoding of one message.

use crate::error::TransportError;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload accepted in either direction
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Encode one message as a complete frame (length prefix included)
pub fn encode<M: Serialize>(msg: &M) -> Result<Vec<u8>, TransportError> {
    let payload = bincode::serialize(msg)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(payload.len()));
    }
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode a frame payload (without its length prefix)
pub fn decode<M: DeserializeOwned>(payload: &[u8]) -> Result<M, TransportError> {
    bincode::deserialize(payload).map_err(|e| TransportError::Deserialization(e.to_string()))
}

/// Write one frame and flush
pub async fn write_frame<W, M>(writer: &mut W, msg: &M) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    let frame = encode(msg)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. Returns `None` on a clean end of stream between frames.
pub async fn read_frame<R, M>(reader: &mut R) -> Result<Option<M>, TransportError>
where
    R: AsyncRead + Unpin,
    M: DeserializeOwned,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    decode(&payload).map(Some)
}
