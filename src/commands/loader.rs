//! Loads the command registry from a directory of descriptor files.
//!
//! Only `*.json` files are read, in file-name order. A file that cannot be
//! read or parsed is skipped with a warning; only a missing or unreadable
//! directory fails the load.

use crate::commands::descriptor::parse_descriptor_file;
use crate::commands::registry::{CommandRecord, CommandRegistry};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read command directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Builds a registry from every descriptor file in `dir`.
pub fn load_registry(dir: impl AsRef<Path>) -> Result<CommandRegistry, LoadError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| LoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    files.push(path);
                }
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry"),
        }
    }
    files.sort();

    let mut registry = CommandRegistry::new();
    for path in &files {
        load_file(&mut registry, path);
    }

    for record in registry.records().filter(|r| !r.handler.is_resolved()) {
        warn!(command = %record.name, handler = ?record.handler, "Command has no handler bound");
    }

    info!(
        dir = %dir.display(),
        files = files.len(),
        commands = registry.len(),
        "Command registry loaded"
    );
    if registry.is_empty() {
        warn!(dir = %dir.display(), "No commands registered; every request will be rejected");
    }
    Ok(registry)
}

fn load_file(registry: &mut CommandRegistry, path: &Path) {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Skipping unreadable descriptor file");
            return;
        }
    };

    let descriptors = match parse_descriptor_file(&text) {
        Ok(descriptors) => descriptors,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Skipping malformed descriptor file");
            return;
        }
    };

    for (name, descriptor) in &descriptors {
        let record = CommandRecord::from_descriptor(name, descriptor);
        debug!(command = %record.name, file = %path.display(), "Registered command");
        if let Some(previous) = registry.insert(record) {
            warn!(command = %previous.name, file = %path.display(), "Descriptor overrides an earlier definition");
        }
    }
}
