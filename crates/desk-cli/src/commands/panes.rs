//! `panes parse` and `panes encode`

use anyhow::Context;
use desk_router::{parse_panes_segment, to_path, RouterPanes};
use std::io::Write;

/// Print the router panes of a path as JSON
///
/// # Errors
/// Fails on a malformed path or a closed writer.
pub fn parse(path: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let panes = parse_panes_segment(path).with_context(|| format!("cannot parse pane path '{path}'"))?;
    tracing::debug!(groups = panes.len(), "parsed pane path");
    serde_json::to_writer_pretty(&mut *out, &panes)?;
    writeln!(out)?;
    Ok(())
}

/// Print the path of router panes given as JSON
///
/// # Errors
/// Fails on malformed JSON or a closed writer.
pub fn encode(json: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let panes: RouterPanes = serde_json::from_str(json).context("router panes must be a JSON array of pane groups")?;
    writeln!(out, "{}", to_path(&panes))?;
    Ok(())
}
