//! Command line definition

use crate::commands::mcp::Editor;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Build the `desk` command tree
#[must_use]
pub fn build_cli() -> Command {
    Command::new("desk")
        .version(crate::VERSION)
        .about("Studio desk pane routing and structure tools")
        .disable_version_flag(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("Print version"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging and full error causes"),
        )
        .subcommand(panes_command())
        .subcommand(structure_command())
        .subcommand(mcp_command())
}

fn panes_command() -> Command {
    Command::new("panes")
        .about("Pane path codec")
        .subcommand_required(true)
        .subcommand(
            Command::new("parse")
                .about("Parse a pane path into router panes JSON")
                .arg(Arg::new("path").required(true).help("Pane path, e.g. author;a1|,view=preview")),
        )
        .subcommand(
            Command::new("encode")
                .about("Encode router panes JSON as a pane path")
                .arg(Arg::new("json").required(true).help("Router panes as a JSON array of groups")),
        )
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Structure config file (.toml or .json)")
}

fn resolver_arg() -> Arg {
    Arg::new("resolver")
        .long("resolver")
        .value_parser(value_parser!(PathBuf))
        .help("Resolver settings file (.toml)")
}

fn structure_command() -> Command {
    Command::new("structure")
        .about("Resolve panes and intents against a structure config")
        .subcommand_required(true)
        .subcommand(
            Command::new("resolve")
                .about("Resolve a pane path to its panes")
                .arg(config_arg())
                .arg(resolver_arg())
                .arg(Arg::new("path").help("Pane path; the root only when absent"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("intent")
                .about("Resolve an intent to a pane path")
                .arg(config_arg())
                .arg(resolver_arg())
                .arg(
                    Arg::new("intent")
                        .long("intent")
                        .short('i')
                        .required(true)
                        .help("Intent name, e.g. edit or create"),
                )
                .arg(
                    Arg::new("param")
                        .long("param")
                        .short('p')
                        .action(ArgAction::Append)
                        .help("Intent parameter as key=value"),
                )
                .arg(
                    Arg::new("fallback-editor")
                        .long("fallback-editor")
                        .action(ArgAction::SetTrue)
                        .help("Open a bare editor when no pane accepts the intent"),
                ),
        )
}

fn mcp_command() -> Command {
    Command::new("mcp")
        .about("MCP server setup for editors")
        .subcommand_required(true)
        .subcommand(
            Command::new("configure")
                .about("Add the Sanity MCP server to editor config files")
                .arg(
                    Arg::new("editor")
                        .long("editor")
                        .short('e')
                        .required(true)
                        .action(ArgAction::Append)
                        .value_parser(Editor::NAMES)
                        .help("Editor to configure; repeat for several"),
                )
                .arg(
                    Arg::new("root")
                        .long("root")
                        .value_parser(value_parser!(PathBuf))
                        .help("Project directory; the current directory when absent"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn short_version_flag() {
        let err = build_cli().try_get_matches_from(["desk", "-v"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn debug_is_global() {
        let matches = build_cli()
            .try_get_matches_from(["desk", "panes", "parse", "author", "-d"])
            .unwrap();
        assert!(matches.get_flag("debug"));
    }

    #[test]
    fn unknown_editor_is_rejected() {
        let err = build_cli()
            .try_get_matches_from(["desk", "mcp", "configure", "--editor", "notepad"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}
