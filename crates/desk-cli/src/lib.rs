//! Desk CLI - command line tools for the studio desk
//!
//! Provides:
//! - `panes parse|encode`: the pane path codec
//! - `structure resolve|intent`: pane and intent resolution against a
//!   structure config file
//! - `mcp configure`: editor config for the Sanity MCP server

pub mod cli;
pub mod commands;
pub mod config;
pub mod tracing_setup;

pub use cli::build_cli;
pub use config::CliConfig;

use anyhow::{bail, Context};
use clap::ArgMatches;
use commands::mcp::Editor;
use desk_structure::IntentRequest;
use std::io::Write;
use std::path::PathBuf;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dispatch parsed arguments to a command
///
/// # Errors
/// Returns the failing command's error, with context.
pub async fn run(matches: &ArgMatches, config: &CliConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("panes", sub)) => match sub.subcommand() {
            Some(("parse", args)) => commands::panes::parse(required(args, "path")?, out),
            Some(("encode", args)) => commands::panes::encode(required(args, "json")?, out),
            _ => bail!("unknown panes command"),
        },
        Some(("structure", sub)) => {
            let Some((name, args)) = sub.subcommand() else {
                bail!("missing structure command");
            };
            let config = with_resolver_args(config, args)?;
            let structure_path = required_path(args, "config")?;
            match name {
                "resolve" => {
                    let path = args.get_one::<String>("path").map_or("", String::as_str);
                    commands::structure::resolve(&structure_path, path, args.get_flag("json"), &config, out).await
                }
                "intent" => {
                    let params = commands::structure::parse_params(
                        args.get_many::<String>("param").into_iter().flatten().map(String::as_str),
                    )?;
                    let request = IntentRequest::new(required(args, "intent")?, params);
                    commands::structure::intent(&structure_path, &request, &config, out).await
                }
                other => bail!("unknown structure command '{other}'"),
            }
        }
        Some(("mcp", sub)) => match sub.subcommand() {
            Some(("configure", args)) => {
                let editors = args
                    .get_many::<String>("editor")
                    .into_iter()
                    .flatten()
                    .map(|name| name.parse::<Editor>())
                    .collect::<anyhow::Result<Vec<_>>>()?;
                let root = match args.get_one::<PathBuf>("root") {
                    Some(root) => root.clone(),
                    None => std::env::current_dir().context("cannot determine the current directory")?,
                };
                for path in commands::mcp::configure(&editors, &root, config)? {
                    writeln!(out, "Configured {}", path.display())?;
                }
                Ok(())
            }
            _ => bail!("unknown mcp command"),
        },
        Some((other, _)) => bail!("unknown command group '{other}'"),
        None => bail!("missing command"),
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument '{name}'"))
}

fn required_path(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing argument '{name}'"))
}

fn with_resolver_args(config: &CliConfig, args: &ArgMatches) -> anyhow::Result<CliConfig> {
    let mut config = match args.get_one::<PathBuf>("resolver") {
        Some(path) => config.clone().with_resolver_file(path)?,
        None => config.clone(),
    };
    if args.try_get_one::<bool>("fallback-editor").ok().flatten().copied().unwrap_or(false) {
        config.resolver.fallback_editor = true;
    }
    Ok(config)
}

/// Render an error for the terminal: the full cause chain in debug mode,
/// otherwise only the top-level message
#[must_use]
pub fn format_error(err: &anyhow::Error, debug: bool) -> String {
    if debug {
        format!("Error: {err:?}")
    } else {
        format!("Error: {err}")
    }
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the CLI from code
    pub use crate::commands::mcp::{ConfigFormat, Editor};
    pub use crate::{build_cli, format_error, run, CliConfig};
}
