//! # stufftext-firewall
//!
//! The packet handlers that enforce the qwstfw policy.
//!
//! 1. **[`StufftextFilter`]** (server -> client) -- splits every
//!    `svc_stufftext` payload into console commands, keeps only those with an
//!    allowed prefix, and queues the configured alias commands whenever the
//!    server signals that the client entered the game.
//! 2. **[`DownloadGuard`]** (client -> server) -- removes `download`
//!    requests and tells the client to disconnect.  Only registered when the
//!    policy disallows downloads.
//!
//! Both handlers only ever remove or rewrite entries of the packet they are
//! given; anything they generate for the client goes through the
//! connection's injection queue.

mod download_guard;
mod stufftext_filter;

pub use download_guard::{is_download_request, DownloadGuard, BLOCK_NOTICE, FORCED_DISCONNECT};
pub use stufftext_filter::{FilteredPayload, StufftextFilter};
