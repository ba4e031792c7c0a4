//! `mcp configure`: register the Sanity MCP server with editors
//!
//! Each editor keeps its servers in a JSON or TOML file at a fixed path
//! under the project root. The `Sanity` entry is merged in place; every
//! other key in the file is left as found.

use crate::config::CliConfig;
use anyhow::{bail, Context};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Key of the server entry written into every editor config
pub const SERVER_NAME: &str = "Sanity";

/// File format of an editor config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON object
    Json,
    /// TOML table
    Toml,
}

/// Supported editors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Editor {
    /// Cursor
    Cursor,
    /// VS Code
    VsCode,
    /// Claude Code
    Claude,
    /// Codex CLI
    Codex,
}

impl Editor {
    /// Every editor
    pub const ALL: [Editor; 4] = [Editor::Cursor, Editor::VsCode, Editor::Claude, Editor::Codex];
    /// Command line names, in `ALL` order
    pub const NAMES: [&'static str; 4] = ["cursor", "vscode", "claude", "codex"];

    /// Command line name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Editor::Cursor => "cursor",
            Editor::VsCode => "vscode",
            Editor::Claude => "claude",
            Editor::Codex => "codex",
        }
    }

    /// Config file relative to the project root
    #[must_use]
    pub fn relative_path(self) -> &'static str {
        match self {
            Editor::Cursor => ".cursor/mcp.json",
            Editor::VsCode => ".vscode/mcp.json",
            Editor::Claude => ".mcp.json",
            Editor::Codex => ".codex/config.toml",
        }
    }

    /// Config file format
    #[must_use]
    pub fn format(self) -> ConfigFormat {
        match self {
            Editor::Codex => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }

    /// Key holding the server map
    #[must_use]
    pub fn servers_key(self) -> &'static str {
        match self {
            Editor::VsCode => "servers",
            Editor::Codex => "mcp_servers",
            Editor::Cursor | Editor::Claude => "mcpServers",
        }
    }

    /// Server entry for this editor
    #[must_use]
    pub fn server_entry(self, config: &CliConfig) -> Value {
        let url = config.mcp_url();
        let authorization = config.auth_token.as_ref().map(|token| format!("Bearer {token}"));
        match self {
            Editor::Codex => {
                let mut entry = json!({ "url": url });
                if let Some(authorization) = authorization {
                    entry["http_headers"] = json!({ "Authorization": authorization });
                }
                entry
            }
            _ => {
                let mut entry = json!({ "type": "http", "url": url });
                if let Some(authorization) = authorization {
                    entry["headers"] = json!({ "Authorization": authorization });
                }
                entry
            }
        }
    }
}

impl fmt::Display for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Editor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Editor::ALL
            .into_iter()
            .find(|editor| editor.name().eq_ignore_ascii_case(s))
            .with_context(|| format!("unknown editor '{s}'"))
    }
}

/// Merge the server entry into a JSON config document
///
/// # Errors
/// Fails if the document, or its server map, is not a JSON object.
pub fn merge_json(existing: Option<&str>, servers_key: &str, entry: Value) -> anyhow::Result<String> {
    let mut root = match existing.filter(|s| !s.trim().is_empty()) {
        Some(input) => serde_json::from_str::<Value>(input).context("existing config is not valid JSON")?,
        None => Value::Object(Map::new()),
    };
    let Some(object) = root.as_object_mut() else {
        bail!("existing config is not a JSON object");
    };
    let servers = object
        .entry(servers_key)
        .or_insert(Value::Object(Map::new()));
    let Some(servers) = servers.as_object_mut() else {
        bail!("'{servers_key}' is not a JSON object");
    };
    servers.insert(SERVER_NAME.to_string(), entry);

    let mut out = serde_json::to_string_pretty(&root)?;
    out.push('\n');
    Ok(out)
}

/// Merge the server entry into a TOML config document
///
/// # Errors
/// Fails if the document, or its server table, is not a TOML table.
pub fn merge_toml(existing: Option<&str>, servers_key: &str, entry: Value) -> anyhow::Result<String> {
    let mut root: toml::Table = match existing {
        Some(input) => toml::from_str(input).context("existing config is not valid TOML")?,
        None => toml::Table::new(),
    };
    let servers = root
        .entry(servers_key)
        .or_insert(toml::Value::Table(toml::Table::new()));
    let Some(servers) = servers.as_table_mut() else {
        bail!("'{servers_key}' is not a TOML table");
    };
    let entry = toml::Value::try_from(entry).context("server entry is not representable as TOML")?;
    servers.insert(SERVER_NAME.to_string(), entry);

    Ok(toml::to_string_pretty(&root)?)
}

/// Write the server entry for each editor under `root`
///
/// Returns the files written, in editor order. Duplicate editors are
/// written once.
///
/// # Errors
/// Fails on the first file that cannot be read, merged or written.
pub fn configure(editors: &[Editor], root: &Path, config: &CliConfig) -> anyhow::Result<Vec<PathBuf>> {
    if config.auth_token.is_none() {
        tracing::warn!("SANITY_AUTH_TOKEN is not set; writing server entries without credentials");
    }

    let mut written = Vec::new();
    let mut seen = Vec::new();
    for &editor in editors {
        if seen.contains(&editor) {
            continue;
        }
        seen.push(editor);

        let path = root.join(editor.relative_path());
        let existing = match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e).with_context(|| format!("cannot read {}", path.display())),
        };

        let entry = editor.server_entry(config);
        let merged = match editor.format() {
            ConfigFormat::Json => merge_json(existing.as_deref(), editor.servers_key(), entry),
            ConfigFormat::Toml => merge_toml(existing.as_deref(), editor.servers_key(), entry),
        }
        .with_context(|| format!("cannot update {}", path.display()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("cannot create {}", parent.display()))?;
        }
        std::fs::write(&path, merged).with_context(|| format!("cannot write {}", path.display()))?;
        tracing::info!(editor = %editor, path = %path.display(), "configured MCP server");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_match_editors() {
        for (editor, name) in Editor::ALL.into_iter().zip(Editor::NAMES) {
            assert_eq!(editor.name(), name);
            assert_eq!(name.parse::<Editor>().unwrap(), editor);
        }
        assert!("notepad".parse::<Editor>().is_err());
    }

    #[test]
    fn json_merge_keeps_other_keys() {
        let existing = r#"{"theme":"dark","mcpServers":{"Other":{"command":"other"}}}"#;
        let merged = merge_json(Some(existing), "mcpServers", json!({"url": "u"})).unwrap();
        let value: Value = serde_json::from_str(&merged).unwrap();
        assert_eq!(value["theme"], "dark");
        assert_eq!(value["mcpServers"]["Other"]["command"], "other");
        assert_eq!(value["mcpServers"]["Sanity"]["url"], "u");
    }

    #[test]
    fn json_merge_rejects_non_objects() {
        assert!(merge_json(Some("[1]"), "servers", json!({})).is_err());
        assert!(merge_json(Some(r#"{"servers": 3}"#), "servers", json!({})).is_err());
        assert!(merge_json(Some("{"), "servers", json!({})).is_err());
    }

    #[test]
    fn toml_merge_keeps_other_tables() {
        let existing = "model = \"o3\"\n\n[mcp_servers.other]\ncommand = \"other\"\n";
        let merged = merge_toml(Some(existing), "mcp_servers", json!({"url": "u"})).unwrap();
        let table: toml::Table = toml::from_str(&merged).unwrap();
        assert_eq!(table["model"].as_str(), Some("o3"));
        assert_eq!(table["mcp_servers"]["other"]["command"].as_str(), Some("other"));
        assert_eq!(table["mcp_servers"]["Sanity"]["url"].as_str(), Some("u"));
    }

    #[test]
    fn entry_carries_token_when_set() {
        let config = CliConfig::default().with_auth_token("sk-1");
        let entry = Editor::Cursor.server_entry(&config);
        assert_eq!(entry["headers"]["Authorization"], "Bearer sk-1");
        assert_eq!(entry["type"], "http");

        let codex = Editor::Codex.server_entry(&CliConfig::default());
        assert!(codex.get("http_headers").is_none());
    }
}
