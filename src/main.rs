//! MintKV - A Small Redis-Compatible Key-Value Server
//!
//! Entry point: reads the command line, loads the command descriptors and
//! serves clients until Ctrl+C.

use anyhow::Context;
use mintkv::commands::load_registry;
use mintkv::config::{CliAction, ServerConfig, HELP};
use mintkv::server::{serve, ServerContext};
use std::sync::atomic::Ordering;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &ServerConfig) {
    let timeout = match config.idle_timeout {
        Some(t) => format!("{}s", t.as_secs()),
        None => "off".to_string(),
    };

    println!(
        r#"
MintKV v{} - Small Redis-Compatible Key-Value Server
──────────────────────────────────────────────────────
Address:        {}
Commands dir:   {}
Idle timeout:   {}

Use Ctrl+C to shutdown gracefully.
"#,
        mintkv::VERSION,
        config.bind_address(),
        config.commands_dir.display(),
        timeout,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match ServerConfig::from_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(config)) => config,
        Ok(CliAction::Help) => {
            println!("{}", HELP);
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("MintKV version {}", mintkv::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", HELP);
            std::process::exit(1);
        }
    };

    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    print_banner(&config);

    let registry = load_registry(&config.commands_dir).with_context(|| {
        format!(
            "failed to load command descriptors from {}",
            config.commands_dir.display()
        )
    })?;

    let context = ServerContext::new(registry, config.idle_timeout);
    let stats = context.stats.clone();
    let store = context.store.clone();

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    };

    tokio::select! {
        _ = serve(listener, context) => {}
        _ = shutdown => {}
    }

    if !store.is_empty() {
        info!(keys = store.len(), "Discarding in-memory keys");
    }
    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        bytes_read = stats.bytes_read.load(Ordering::Relaxed),
        bytes_written = stats.bytes_written.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}
