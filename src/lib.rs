//! # MintKV - A Small Redis-Compatible Key-Value Server
//!
//! MintKV speaks enough of the Redis protocol for `redis-cli` and the usual
//! client libraries to run `PING`, `ECHO`, `SET` and `GET` against it. Which
//! commands exist is not hard-coded: the server reads JSON command descriptors
//! at startup and binds each name to a handler.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               MintKV                                    │
//! │                                                                         │
//! │  commands/*.json ──> CommandRegistry (Arc, read-only after startup)     │
//! │                                   │                                     │
//! │  ┌─────────────┐    ┌─────────────┴──┐    ┌──────────────────┐          │
//! │  │ TCP Server  │───>│  Connection    │───>│ Executor task    │          │
//! │  │ (serve)     │    │  reader loop   │<───│ (one per client) │          │
//! │  └─────────────┘    └────────────────┘    └────────┬─────────┘          │
//! │                        RespParser                  │                    │
//! │                        Reply encoder               ▼                    │
//! │                                     ┌──────────────────────────────┐    │
//! │                                     │ Store                        │    │
//! │                                     │ Mutex<HashMap<Bytes, Entry>> │    │
//! │                                     └──────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use mintkv::commands::load_registry;
//! use mintkv::server::{serve, ServerContext};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = load_registry("commands")?;
//!     let context = ServerContext::new(registry, None);
//!
//!     let listener = TcpListener::bind("127.0.0.1:6379").await?;
//!     serve(listener, context).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `PING [message]`
//! - `ECHO message`
//! - `SET key value [PX milliseconds]`
//! - `GET key`
//!
//! A descriptor naming a function the server does not know still registers
//! the command; calling it replies with an error instead of closing the
//! connection.
//!
//! ## Module Overview
//!
//! - [`protocol`]: inline and RESP request decoding, reply encoding
//! - [`storage`]: the shared store with lazy expiry
//! - [`commands`]: descriptor loading, the registry and command handlers
//! - [`connection`]: per-client reader loop and executor
//! - [`server`]: the accept loop
//! - [`config`]: command-line configuration
//!
//! ## Ordering
//!
//! Each connection sends its commands to its own executor task, which runs
//! them one at a time. A client that pipelines requests gets its replies
//! back in the order it sent them, while separate clients proceed in
//! parallel against the shared store.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{load_registry, CommandHandler, CommandRegistry};
pub use config::ServerConfig;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, Reply, RespParser, RespValue};
pub use server::{serve, ServerContext};
pub use storage::Store;

/// The default port MintKV listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host MintKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Where command descriptors are read from unless configured otherwise
pub const DEFAULT_COMMANDS_DIR: &str = "commands";

/// Version of MintKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
