//! # policy-engine
//!
//! Core policy logic for the qwstfw proxy.  This crate loads the sectioned
//! `qwstfw.cfg` policy file and answers the two questions the packet handlers
//! ask about every console command: is it allowed to reach the client, and
//! does it signal that the client entered the game.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use policy_engine::{PolicyEngine, loader};
//!
//! let config = loader::load_policy("qwstfw.cfg").unwrap();
//! let engine = PolicyEngine::new(config);
//! let decision = engine.evaluate("say hello");
//! println!("{:?}", decision);
//! ```

mod decision;
mod evaluator;
pub mod loader;
pub mod matcher;
mod schema;

// Re-export primary public API at crate root.
pub use decision::{PolicyDecision, ResolvedAction};
pub use evaluator::PolicyEngine;
pub use loader::LoadError;
pub use schema::PolicyConfig;
