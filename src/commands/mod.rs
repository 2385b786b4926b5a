//! Command Layer
//!
//! Command names are bound to handlers by descriptor files loaded at startup.
//!
//! ```text
//! commands/*.json
//!       │  load_registry()
//!       ▼
//! ┌─────────────────┐
//! │ CommandRegistry │  NAME -> CommandRecord { handler, flags, ... }
//! └────────┬────────┘
//!          │ Arc, read-only
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  lookup, run handler, build Reply
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Store       │  (storage module)
//! └─────────────────┘
//! ```

pub mod descriptor;
pub mod handler;
pub mod loader;
pub mod registry;

pub use descriptor::{ArgumentDescriptor, CommandDescriptor};
pub use handler::{CommandError, CommandHandler};
pub use loader::{load_registry, LoadError};
pub use registry::{CommandFlags, CommandRecord, CommandRegistry, HandlerKind};
