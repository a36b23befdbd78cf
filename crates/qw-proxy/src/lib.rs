//! UDP relay for the qwstfw project.
//!
//! This crate implements a transparent QuakeWorld proxy that sits between
//! game clients and one upstream server. Every sequenced datagram flowing
//! through the proxy is decoded and passed through the [`PacketHandler`]s
//! registered for its direction, allowing the firewall to drop or rewrite
//! console commands in real time.
//!
//! # Architecture
//!
//! ```text
//! Client  <--UDP-->  qw-proxy  <--UDP-->  Server
//!                       |
//!                  [Handlers]
//!                       |
//!                [InjectionQueue]
//! ```
//!
//! Each client address gets its own session task and upstream socket, so
//! handlers for one connection always run one packet at a time. Commands the
//! handlers queue for the client ride along with the next server packet.
//! Connectionless datagrams (challenges, connect, status) are relayed
//! without inspection.

pub mod inject;
pub mod listener;
pub mod relay;

// Re-export the primary public types at the crate root for convenience.
pub use inject::InjectionQueue;
pub use listener::{Proxy, ProxyConfig};
pub use relay::{Connection, Handlers, PacketHandler};
