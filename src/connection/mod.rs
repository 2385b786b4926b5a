//! Connection Handling
//!
//! Every accepted socket gets a reader task and an executor task:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (server.rs)                              │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ accept() + spawn
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read bytes  │───>│   Decode    │───>│   Submit    │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │         ▲                                     │ mpsc        │
//! │         │                                     ▼             │
//! │  ┌─────────────┐    oneshot          ┌─────────────┐        │
//! │  │ Write reply │<────────────────────│  Executor   │        │
//! │  └─────────────┘                     └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use mintkv::commands::{load_registry, CommandHandler};
//! use mintkv::connection::{handle_connection, ConnectionStats};
//! use mintkv::storage::Store;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(load_registry("commands")?);
//! let store = Arc::new(Store::new());
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! let handler = CommandHandler::new(Arc::clone(&registry), Arc::clone(&store));
//! tokio::spawn(handle_connection(stream, addr, handler, Arc::clone(&stats), None));
//! ```

pub mod executor;
pub mod handler;

pub use executor::{Execute, ExecutorClosed, ExecutorHandle};
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
