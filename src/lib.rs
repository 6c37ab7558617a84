//! Browse, summarize and add to a personal transaction ledger kept in a Google sheet.
//!
//! The same commands are served on the command line and, for AI agents, as MCP tools.

mod api;
pub mod args;
pub mod commands;
mod config;
pub mod engine;
mod error;
mod mcp;
pub mod model;
#[cfg(test)]
mod test;
mod utils;

pub use api::{Completion, CompletionRequest, Ledger, Mode};
pub use config::{CompletionConfig, Config};
pub use error::{Error, ErrorType, Result};
