//! The `transport` module accepts inbound connections and performs the
//! WebSocket upgrade before handing each socket to a session.

pub mod websocket;

pub use websocket::{serve, start_websocket_server, websocket_config};

#[cfg(test)]
mod tests;
