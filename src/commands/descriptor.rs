//! Command descriptor files.
//!
//! Each file maps command names to their metadata:
//!
//! ```json
//! {
//!   "GET": {
//!     "summary": "Returns the string value of a key.",
//!     "group": "string",
//!     "arity": 1,
//!     "function": "handleGetCommand",
//!     "command_flags": ["READONLY", "FAST"],
//!     "acl_categories": ["@read", "@string", "@fast"],
//!     "arguments": [{ "name": "key", "type": "key" }]
//!   }
//! }
//! ```
//!
//! Missing fields fall back to their defaults.

use serde::Deserialize;
use std::collections::BTreeMap;

/// The contents of one descriptor file, keyed by command name.
pub type DescriptorFile = BTreeMap<String, CommandDescriptor>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommandDescriptor {
    pub summary: String,
    pub complexity: String,
    pub group: String,
    pub since: String,
    /// Minimum positional argument count
    pub arity: i32,
    /// Token naming the built-in handler, e.g. `handleSetCommand`
    #[serde(rename = "function")]
    pub function_name: String,
    pub command_flags: Vec<String>,
    pub acl_categories: Vec<String>,
    pub command_tips: Vec<String>,
    /// Accepted for documentation only; handlers validate their own arguments.
    pub arguments: Vec<ArgumentDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArgumentDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub optional: bool,
}

/// Parses the JSON text of a descriptor file.
pub fn parse_descriptor_file(json: &str) -> serde_json::Result<DescriptorFile> {
    serde_json::from_str(json)
}
