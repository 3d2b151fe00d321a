//! Length-prefixed JSON framing for sync messages over a byte stream.

use crate::protocol::SyncMessage;
use serde::{Deserialize, Serialize};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size (16 MB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Whether a frame opens an exchange or answers one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Request,
    Response,
}

/// One message on a connection. A response carries the id of its request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub id: u64,
    pub kind: FrameKind,
    pub message: SyncMessage,
}

impl Frame {
    pub fn request(id: u64, message: SyncMessage) -> Self {
        Self {
            id,
            kind: FrameKind::Request,
            message,
        }
    }

    pub fn response(id: u64, message: SyncMessage) -> Self {
        Self {
            id,
            kind: FrameKind::Response,
            message,
        }
    }
}

/// Reads a length-prefixed JSON frame.
pub async fn read_frame<T: AsyncRead + Unpin>(io: &mut T) -> io::Result<Frame> {
    let len = io.read_u32().await? as usize;
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} bytes"),
        ));
    }

    let mut buf = vec![0u8; len];
    io.read_exact(&mut buf).await?;

    serde_json::from_slice(&buf).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("JSON decode error: {e}"),
        )
    })
}

/// Writes a length-prefixed JSON frame and flushes.
pub async fn write_frame<T: AsyncWrite + Unpin>(io: &mut T, frame: &Frame) -> io::Result<()> {
    let data = serde_json::to_vec(frame).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("JSON encode error: {e}"),
        )
    })?;
    if data.len() > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {} bytes", data.len()),
        ));
    }

    io.write_u32(data.len() as u32).await?;
    io.write_all(&data).await?;
    io.flush().await
}
