//! Argument parsing: a `clap`-derived [`Cli`] with a global [`OrchestratorConfig`]
//! and three subcommands, matching `cuenv-cli`'s `Cli`/`Commands` split.

use crate::config::OrchestratorConfig;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;

/// Top-level arguments: a subcommand plus the config flags shared by all
/// three of them.
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(about = "Incremental build orchestrator core — demo binary")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub config: OrchestratorConfig,

    /// Log level (`trace`/`debug`/`info`/`warn`/`error`).
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    pub level: String,
}

/// The three subcommands the demo binary supports.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report which targets are stale without building anything.
    Check {
        /// Target ids to check, each naming a subdirectory under `--root`.
        targets: Vec<String>,
    },
    /// Build every stale target, recording run info and reports.
    Build {
        /// Target ids to build, each naming a subdirectory under `--root`.
        targets: Vec<String>,
    },
    /// Serve a prior run's `info_dir`/`root` over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
}

/// Parse [`Cli`] from the process's actual command line.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_with_default_config() {
        let cli = Cli::try_parse_from(["kiln", "check", "a", "b"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { targets } if targets == vec!["a", "b"]));
        assert_eq!(cli.config.num_workers, 4);
        assert_eq!(cli.config.allowed_clients, vec!["127.0.0.1"]);
    }

    #[test]
    fn parses_build_with_overridden_flags() {
        let cli = Cli::try_parse_from([
            "kiln", "--num-workers", "8", "--invalidate-dependents", "build", "a",
        ])
        .unwrap();
        assert!(cli.config.invalidate_dependents);
        assert_eq!(cli.config.num_workers, 8);
        assert!(matches!(cli.command, Commands::Build { targets } if targets == vec!["a"]));
    }

    #[test]
    fn parses_serve_with_custom_addr() {
        let cli = Cli::try_parse_from(["kiln", "serve", "--addr", "0.0.0.0:9000"]).unwrap();
        let Commands::Serve { addr } = cli.command else { panic!("expected Serve") };
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn allowed_clients_accepts_comma_separated_list() {
        let cli = Cli::try_parse_from(["kiln", "--allowed-clients", "10.0.0.1,10.0.0.2", "check"]).unwrap();
        assert_eq!(cli.config.allowed_clients, vec!["10.0.0.1", "10.0.0.2"]);
    }
}
