//! Codey turns plain-text chat transcripts into streamed LLM completions.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns document parsing (front matter, delimiter tokenizing,
//!   role assignment), provider routing, the streaming completion engine,
//!   reply framing, and user configuration.
//! - [`api`] defines the chat-completion payloads sent to providers.
//! - [`utils`] holds URL, authentication-header, and input helpers.
//! - [`logging`] installs the stderr diagnostics subscriber.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which parses arguments and dispatches to
//! the `prompt`, `save`, `parse`, and listing commands.

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod utils;
