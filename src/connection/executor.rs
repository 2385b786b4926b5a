//! Per-Connection Command Executor
//!
//! Each connection owns one executor task. The reader loop submits decoded
//! commands through a bounded channel and waits on a oneshot for the reply:
//!
//! ```text
//!  reader loop                         executor task
//!  ───────────                         ─────────────
//!  submit(cmd) ──── mpsc::Sender ────> recv()
//!       │                                 │ execute(cmd)
//!       ▼                                 ▼
//!  await reply <─── oneshot::Sender ─── send(reply)
//! ```
//!
//! The task runs one command at a time, in the order they were received, so
//! replies for one connection can never overtake each other. Different
//! connections have different tasks and run in parallel.

use crate::commands::CommandHandler;
use crate::protocol::{Command, Reply};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

/// How many submissions may wait for the executor before `submit` blocks.
const QUEUE_DEPTH: usize = 16;

/// Something that turns a command into a reply.
pub trait Execute: Send + 'static {
    fn execute(&self, command: &Command) -> Reply;
}

impl Execute for CommandHandler {
    fn execute(&self, command: &Command) -> Reply {
        CommandHandler::execute(self, command)
    }
}

/// The executor task is gone and can take no more commands.
#[derive(Debug, Error)]
#[error("command executor has shut down")]
pub struct ExecutorClosed;

struct Request {
    command: Command,
    reply_tx: oneshot::Sender<Reply>,
}

/// Submission side of a connection's executor.
///
/// The task exits once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct ExecutorHandle {
    tx: mpsc::Sender<Request>,
}

impl ExecutorHandle {
    /// Spawns the executor task on the current Tokio runtime.
    pub fn spawn<E: Execute>(executor: E) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(run(executor, rx));
        Self { tx }
    }

    /// Queues `command` and waits for its reply.
    pub async fn submit(&self, command: Command) -> Result<Reply, ExecutorClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(Request { command, reply_tx })
            .await
            .map_err(|_| ExecutorClosed)?;

        reply_rx.await.map_err(|_| ExecutorClosed)
    }
}

async fn run<E: Execute>(executor: E, mut rx: mpsc::Receiver<Request>) {
    while let Some(request) = rx.recv().await {
        let reply = executor.execute(&request.command);
        // The submitter may have gone away; the reply is simply dropped.
        let _ = request.reply_tx.send(reply);
    }
    trace!("Executor task finished");
}
