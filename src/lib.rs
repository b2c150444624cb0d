//! # wsrelay
//!
//! `wsrelay` is an in-memory WebSocket fan-out relay: every message a
//! connected client sends is rebroadcast, byte for byte, to every client
//! connected at that moment, the sender included. Nothing is stored and late
//! joiners get no history.
//!
//! ## Core Modules
//!
//! - `hub`: the single owner of the session registry; serializes register,
//!   unregister and broadcast requests and evicts slow consumers.
//! - `session`: one connection's mailbox plus its inbound and outbound loops.
//! - `transport`: accepts TCP connections and performs the WebSocket upgrade.
//! - `config`: layered settings (defaults, file, environment).
//! - `client`: a small client used for smoke tests.
//! - `utils`: error type and logging setup.

pub mod cli;
pub mod client;
pub mod config;
pub mod hub;
pub mod session;
pub mod transport;
pub mod utils;
