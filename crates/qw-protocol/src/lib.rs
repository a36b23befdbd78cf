//! QuakeWorld protocol primitives for the qwstfw proxy.
//!
//! The proxy only needs to understand enough of the protocol to find the two
//! text-carrying messages it polices:
//!
//! ```text
//! client -> server   clc_stringcmd   free-form console text typed by the player
//! server -> client   svc_stufftext   console commands the server makes the client run
//! ```
//!
//! Everything else is carried as opaque bytes so that an untouched packet
//! re-encodes byte-for-byte.  The [`codec`] walks every message of the base
//! protocol (version 28) to find where it ends.  Only an unknown message id,
//! a truncated message or a server announcing an extended protocol stops
//! it; the remainder of the packet is then kept verbatim.
//!
//! [`args`] splits a stufftext payload into the individual console commands
//! the client would execute.

pub mod args;
pub mod codec;
pub mod command;
mod layout;
pub mod packet;

// Re-export the primary public types at the crate root for convenience.
pub use args::SubCommand;
pub use codec::{decode_datagram, encode_datagram, DecodeError, MAX_DATAGRAM};
pub use command::{Command, StringCmd, Stufftext};
pub use packet::{Datagram, Direction, Packet};
