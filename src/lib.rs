//! cmdgate - command resolution and permission gating for chat bots.
//!
//! Registered commands are matched against inbound message text by literal
//! structure and typed parameters; a small policy language decides who may run
//! them. The library exposes the core modules for embedding and for
//! integration tests.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod logging;
pub mod permissions;
pub mod runner;

pub use context::ActorContext;
pub use engine::{Engine, Snapshot};
pub use error::{GateError, Result};
