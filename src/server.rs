//! TCP accept loop.

use crate::commands::{CommandHandler, CommandRegistry};
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::error;

/// Everything a connection task shares with the rest of the server.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub registry: Arc<CommandRegistry>,
    pub store: Arc<Store>,
    pub stats: Arc<ConnectionStats>,
    pub idle_timeout: Option<Duration>,
}

impl ServerContext {
    pub fn new(registry: CommandRegistry, idle_timeout: Option<Duration>) -> Self {
        Self {
            registry: Arc::new(registry),
            store: Arc::new(Store::new()),
            stats: Arc::new(ConnectionStats::new()),
            idle_timeout,
        }
    }
}

/// Accepts connections forever, one task per client.
///
/// Accept failures are logged and do not stop the loop.
pub async fn serve(listener: TcpListener, context: ServerContext) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler =
                    CommandHandler::new(Arc::clone(&context.registry), Arc::clone(&context.store));
                let stats = Arc::clone(&context.stats);

                tokio::spawn(handle_connection(
                    stream,
                    addr,
                    handler,
                    stats,
                    context.idle_timeout,
                ));
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
