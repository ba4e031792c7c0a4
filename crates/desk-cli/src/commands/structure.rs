//! `structure resolve` and `structure intent`

use crate::config::CliConfig;
use anyhow::{bail, Context};
use desk_resolver::{
    create_resolved_pane_node_stream, IntentTreeWalk, ResolvedPaneMeta, ResolvedPaneStreamOptions,
    StructureIntentWalker,
};
use desk_router::{parse_panes_segment, to_path, PaneParams};
use desk_structure::{IntentRequest, Structure, StructureConfig};
use futures::{stream, StreamExt};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One resolved pane, as printed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneRow {
    /// Group index (0 is the root)
    pub group: usize,
    /// Index within the group
    pub sibling: usize,
    /// Router id the pane was opened for
    pub router_id: String,
    /// Pane type
    #[serde(rename = "type")]
    pub pane_type: String,
    /// Pane title
    pub title: String,
}

impl From<&ResolvedPaneMeta> for PaneRow {
    fn from(meta: &ResolvedPaneMeta) -> Self {
        Self {
            group: meta.group_index,
            sibling: meta.sibling_index,
            router_id: meta.router_pane_sibling.id.clone(),
            pane_type: meta.pane.type_name().to_string(),
            title: meta.pane.node().map(|node| node.title.clone()).unwrap_or_default(),
        }
    }
}

fn load_structure(path: &Path) -> anyhow::Result<Structure> {
    let structure = StructureConfig::load(path)
        .and_then(|config| config.build())
        .with_context(|| format!("invalid structure config {}", path.display()))?;
    Ok(structure)
}

/// Resolve a pane path once and return its final panes
///
/// # Errors
/// Fails on a malformed path, a broken config or a pane that cannot be resolved.
pub async fn resolve_rows(config_path: &Path, path: &str, config: &CliConfig) -> anyhow::Result<Vec<PaneRow>> {
    let structure = load_structure(config_path)?;
    let panes = parse_panes_segment(path).with_context(|| format!("cannot parse pane path '{path}'"))?;

    let options = ResolvedPaneStreamOptions::new(structure.root, stream::iter([panes]).boxed(), structure.context)
        .with_config(config.resolver.clone());
    let mut resolved = create_resolved_pane_node_stream(options);

    let mut last = None;
    while let Some(emission) = resolved.next().await {
        last = Some(emission.with_context(|| format!("cannot resolve '{path}'"))?);
    }
    let Some(panes) = last else {
        bail!("resolution of '{path}' produced no panes");
    };
    Ok(panes.iter().map(PaneRow::from).collect())
}

/// Print the panes a path resolves to
///
/// # Errors
/// See [`resolve_rows`].
pub async fn resolve(
    config_path: &Path,
    path: &str,
    json: bool,
    config: &CliConfig,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let rows = resolve_rows(config_path, path, config).await?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{:<6} {:<8} {:<24} {:<14} TITLE", "GROUP", "SIBLING", "ROUTER ID", "TYPE")?;
    for row in &rows {
        writeln!(
            out,
            "{:<6} {:<8} {:<24} {:<14} {}",
            row.group, row.sibling, row.router_id, row.pane_type, row.title
        )?;
    }
    Ok(())
}

/// Parse `key=value` intent params, keeping their order
///
/// # Errors
/// Fails on a param without `=` or with an empty key.
pub fn parse_params<'a>(raw: impl IntoIterator<Item = &'a str>) -> anyhow::Result<PaneParams> {
    let mut params = PaneParams::new();
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("intent param '{pair}' is not key=value");
        };
        if key.is_empty() {
            bail!("intent param '{pair}' has an empty key");
        }
        params.push(key, value);
    }
    Ok(params)
}

/// Resolve an intent against the structure and print the resulting path
///
/// # Errors
/// Fails on a broken config, bad params or an intent no pane accepts.
pub async fn intent(
    config_path: &Path,
    request: &IntentRequest,
    config: &CliConfig,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let structure = load_structure(config_path)?;
    let walker =
        StructureIntentWalker::new(structure.root, structure.context).with_config(config.resolver.clone());
    let panes = walker
        .resolve_intent(request)
        .await
        .with_context(|| format!("cannot resolve intent '{}'", request.intent))?;
    writeln!(out, "{}", to_path(&panes))?;
    Ok(())
}
