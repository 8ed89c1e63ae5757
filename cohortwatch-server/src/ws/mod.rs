//! WebSocket module for live viewers

mod connection;
mod protocol;

pub use connection::viewer_ws;
pub use protocol::ServerMessage;
