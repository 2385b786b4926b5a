//! Command Execution
//!
//! Resolves a decoded [`Command`] against the [`CommandRegistry`] and runs the
//! bound handler against the [`Store`].
//!
//! ## Supported Handlers
//!
//! - `PING [message]` - `+PONG`, or the message echoed back as bulk
//! - `ECHO message` - the message as bulk
//! - `SET key value [PX milliseconds]` - `+OK`
//! - `GET key` - the value as bulk, or a null bulk
//!
//! Which names reach which handler is decided by the descriptor files, not here.

use crate::commands::registry::{CommandRegistry, HandlerKind};
use crate::protocol::{Command, Reply, RespValue};
use crate::storage::Store;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, trace};

/// Client-visible command failures. `Display` is the error reply text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR command '{0}' has no handler")]
    Unbound(String),

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("ERR invalid argument type")]
    InvalidArgumentType,

    #[error("ERR invalid key type")]
    InvalidKeyType,

    #[error("ERR invalid value type")]
    InvalidValueType,

    #[error("ERR invalid expiry option")]
    InvalidExpiryOption,

    #[error("ERR invalid expiry type")]
    InvalidExpiryType,

    #[error("ERR invalid expiry value")]
    InvalidExpiryValue,
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Error(err.to_string())
    }
}

type CommandResult = Result<Reply, CommandError>;

/// Executes commands for a connection.
///
/// Cheap to clone; the registry and store are shared.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    registry: Arc<CommandRegistry>,
    store: Arc<Store>,
}

impl CommandHandler {
    pub fn new(registry: Arc<CommandRegistry>, store: Arc<Store>) -> Self {
        Self { registry, store }
    }

    /// The store this handler reads and writes.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Executes a command and returns the reply.
    pub fn execute(&self, command: &Command) -> Reply {
        trace!(command = %command.name, args = command.args.len(), "Executing command");

        self.dispatch(command).unwrap_or_else(Reply::from)
    }

    fn dispatch(&self, command: &Command) -> CommandResult {
        let record = self
            .registry
            .get(&command.name)
            .ok_or_else(|| CommandError::UnknownCommand(command.name.clone()))?;

        match &record.handler {
            HandlerKind::Ping => self.ping(command),
            HandlerKind::Echo => self.echo(command),
            HandlerKind::Set => self.set(command),
            HandlerKind::Get => self.get(command),
            HandlerKind::Unresolved(function) => {
                error!(command = %command.name, function = %function, "Command invoked without a bound handler");
                Err(CommandError::Unbound(command.name.clone()))
            }
        }
    }

    /// PING [message]
    fn ping(&self, command: &Command) -> CommandResult {
        match command.args.as_slice() {
            [] => Ok(Reply::pong()),
            [_] => Ok(Reply::BulkList(command.args.clone())),
            _ => Err(wrong_arity(command)),
        }
    }

    /// ECHO message
    fn echo(&self, command: &Command) -> CommandResult {
        let [message] = command.args.as_slice() else {
            return Err(wrong_arity(command));
        };

        let message = message.text().ok_or(CommandError::InvalidArgumentType)?;
        Ok(Reply::Bulk(message))
    }

    /// SET key value [PX milliseconds]
    fn set(&self, command: &Command) -> CommandResult {
        let (key, value, expiry) = match command.args.as_slice() {
            [key, value] => (key, value, None),
            [key, value, option, ms] => (key, value, Some((option, ms))),
            _ => return Err(wrong_arity(command)),
        };

        let key = key.text().ok_or(CommandError::InvalidKeyType)?;
        let value = value.text().ok_or(CommandError::InvalidValueType)?;

        match expiry {
            Some((option, ms)) => {
                let deadline = parse_px(option, ms)?;
                self.store.set_with_expiry(key, value, deadline);
            }
            None => self.store.set(key, value),
        }

        Ok(Reply::ok())
    }

    /// GET key
    fn get(&self, command: &Command) -> CommandResult {
        let [key] = command.args.as_slice() else {
            return Err(wrong_arity(command));
        };

        let key = key.text().ok_or(CommandError::InvalidKeyType)?;
        Ok(match self.store.get(&key) {
            Some(value) => Reply::Bulk(value),
            None => Reply::Null,
        })
    }
}

fn wrong_arity(command: &Command) -> CommandError {
    CommandError::WrongArity(command.name.clone())
}

/// Validates `PX <milliseconds>` and turns it into an absolute deadline.
///
/// A non-positive count yields a deadline that has already passed.
fn parse_px(option: &RespValue, ms: &RespValue) -> Result<Instant, CommandError> {
    let option = option.text().ok_or(CommandError::InvalidExpiryOption)?;
    if !option.eq_ignore_ascii_case(b"PX") {
        return Err(CommandError::InvalidExpiryOption);
    }

    let ms = ms.text().ok_or(CommandError::InvalidExpiryType)?;
    let ms: i64 = std::str::from_utf8(&ms)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CommandError::InvalidExpiryValue)?;

    let now = Instant::now();
    if ms <= 0 {
        return Ok(now);
    }
    now.checked_add(Duration::from_millis(ms as u64))
        .ok_or(CommandError::InvalidExpiryValue)
}
