//! Command Registry
//!
//! Maps upper-case command names to [`CommandRecord`]s. The registry is built
//! once from descriptors, then shared read-only behind an `Arc`.

use crate::commands::descriptor::CommandDescriptor;
use std::collections::HashMap;
use std::fmt;

/// The built-in handler a command is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    Ping,
    Echo,
    Set,
    Get,
    /// The descriptor named a function this binary does not provide.
    Unresolved(String),
}

impl HandlerKind {
    /// Resolves a descriptor function token.
    pub fn resolve(token: &str) -> Self {
        match token {
            "pingCommand" => HandlerKind::Ping,
            "echoCommand" => HandlerKind::Echo,
            "handleSetCommand" => HandlerKind::Set,
            "handleGetCommand" => HandlerKind::Get,
            other => HandlerKind::Unresolved(other.to_string()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, HandlerKind::Unresolved(_))
    }
}

/// Bit set of command flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CommandFlags(u32);

impl CommandFlags {
    pub const EMPTY: CommandFlags = CommandFlags(0);
    pub const FAST: CommandFlags = CommandFlags(1 << 0);
    pub const SENTINEL: CommandFlags = CommandFlags(1 << 1);

    /// Packs flag tokens. Unknown tokens are ignored.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .fold(Self::EMPTY, |flags, token| match token.as_ref() {
                "FAST" => flags | Self::FAST,
                "SENTINEL" => flags | Self::SENTINEL,
                _ => flags,
            })
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: CommandFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CommandFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        CommandFlags(self.0 | rhs.0)
    }
}

impl fmt::Debug for CommandFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::FAST) {
            names.push("FAST");
        }
        if self.contains(Self::SENTINEL) {
            names.push("SENTINEL");
        }
        write!(f, "CommandFlags({})", names.join(" | "))
    }
}

/// Metadata and handler binding for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    /// Canonical uppercase command name.
    pub name: String,
    pub handler: HandlerKind,
    pub group: String,
    /// Minimum argument count. Descriptive only; handlers check their own arity.
    pub min_args: i32,
    pub flags: CommandFlags,
    /// ACL categories joined with `,`.
    pub category: String,
    pub summary: String,
}

impl CommandRecord {
    pub fn from_descriptor(name: &str, descriptor: &CommandDescriptor) -> Self {
        Self {
            name: name.to_uppercase(),
            handler: HandlerKind::resolve(&descriptor.function_name),
            group: descriptor.group.clone(),
            min_args: descriptor.arity,
            flags: CommandFlags::from_tokens(&descriptor.command_flags),
            category: descriptor.acl_categories.join(","),
            summary: descriptor.summary.clone(),
        }
    }
}

/// Runtime command registry.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandRecord>,
}

impl CommandRegistry {
    /// Builds an empty command registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from `(name, descriptor)` pairs; later names win.
    pub fn from_descriptors<'a, I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a CommandDescriptor)>,
    {
        let mut registry = Self::new();
        for (name, descriptor) in descriptors {
            registry.insert(CommandRecord::from_descriptor(name, descriptor));
        }
        registry
    }

    /// Adds a record under its upper-cased name, returning any record it replaced.
    pub fn insert(&mut self, record: CommandRecord) -> Option<CommandRecord> {
        self.commands.insert(record.name.to_uppercase(), record)
    }

    /// Looks up an already upper-cased command name.
    pub fn get(&self, name: &str) -> Option<&CommandRecord> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterates over all records in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &CommandRecord> {
        self.commands.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::descriptor::parse_descriptor_file;

    #[test]
    fn test_resolve_handler_tokens() {
        assert_eq!(HandlerKind::resolve("pingCommand"), HandlerKind::Ping);
        assert_eq!(HandlerKind::resolve("echoCommand"), HandlerKind::Echo);
        assert_eq!(HandlerKind::resolve("handleSetCommand"), HandlerKind::Set);
        assert_eq!(HandlerKind::resolve("handleGetCommand"), HandlerKind::Get);

        let unknown = HandlerKind::resolve("handleDelCommand");
        assert_eq!(unknown, HandlerKind::Unresolved("handleDelCommand".to_string()));
        assert!(!unknown.is_resolved());
    }

    #[test]
    fn test_flags_ignore_unknown_tokens() {
        let flags = CommandFlags::from_tokens(["WRITE", "FAST", "LOADING", "SENTINEL"]);
        assert!(flags.contains(CommandFlags::FAST));
        assert!(flags.contains(CommandFlags::SENTINEL));
        assert_eq!(flags.bits(), 0b11);

        assert_eq!(CommandFlags::from_tokens(Vec::<&str>::new()), CommandFlags::EMPTY);
        assert_eq!(CommandFlags::from_tokens(["fast"]), CommandFlags::EMPTY);
    }

    #[test]
    fn test_record_from_descriptor() {
        let file = parse_descriptor_file(
            r#"{ "echo": {
                "group": "connection",
                "arity": 1,
                "function": "echoCommand",
                "command_flags": ["FAST", "LOADING"],
                "acl_categories": ["@fast", "@connection"]
            } }"#,
        )
        .unwrap();

        let registry = CommandRegistry::from_descriptors(&file);
        let record = registry.get("ECHO").unwrap();

        assert_eq!(record.name, "ECHO");
        assert_eq!(record.handler, HandlerKind::Echo);
        assert_eq!(record.group, "connection");
        assert_eq!(record.min_args, 1);
        assert_eq!(record.flags, CommandFlags::FAST);
        assert_eq!(record.category, "@fast,@connection");
        assert!(registry.get("echo").is_none());
    }

    #[test]
    fn test_unresolved_command_is_registered() {
        let file =
            parse_descriptor_file(r#"{ "DEL": { "function": "handleDelCommand" } }"#).unwrap();
        let registry = CommandRegistry::from_descriptors(&file);

        assert_eq!(registry.len(), 1);
        assert!(!registry.get("DEL").unwrap().handler.is_resolved());
    }
}
