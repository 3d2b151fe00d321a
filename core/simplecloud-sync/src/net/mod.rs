//! TCP transport for the sync protocol.
//!
//! Messages travel as length-prefixed JSON frames over plain TCP. Every
//! request frame is answered by exactly one response frame with the same id.

pub mod codec;
pub mod connection;
pub mod transport;

pub use codec::{Frame, FrameKind, MAX_FRAME_SIZE, read_frame, write_frame};
pub use connection::PeerConnection;
pub use transport::TcpTransport;
