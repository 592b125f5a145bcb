//! # scpe
//!
//! Command-line front end for the SCPE project store.
//!
//! Each invocation opens the store, runs one subcommand and prints the result
//! as pretty JSON on stdout.  Logs go to stderr so the output stays
//! machine-readable.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use scpe_store::Database;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;
use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "scpe", version, about = "Project, task and team tracking")]
struct Cli {
    /// Database file (overrides SCPE_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,scpe=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    debug!(?config, "Loaded configuration");

    let db = match &config.db_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            Database::open_at(path, config.store.clone())
        }
        None => Database::new(config.store.clone()),
    }
    .context("failed to open the project store")?;
    debug!(path = %db.path().display(), "Store ready");

    let output = commands::run(&db, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use scpe_shared::TaskStatus;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tasks_filters_parse() {
        let cli = Cli::try_parse_from([
            "scpe", "tasks", "-u", "ana", "-p", "secret", "--status", "in_progress",
            "--assignee", "3",
        ])
        .unwrap();

        match cli.command {
            Command::Tasks {
                project,
                status,
                assignee,
                ..
            } => {
                assert_eq!(project, None);
                assert_eq!(status, Some(TaskStatus::InProgress));
                assert_eq!(assignee, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_task_status_is_rejected() {
        let result = Cli::try_parse_from([
            "scpe", "tasks", "-u", "ana", "-p", "secret", "--status", "blocked",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn password_falls_back_to_environment() {
        std::env::set_var("SCPE_PASSWORD", "from-env");
        let cli = Cli::try_parse_from(["scpe", "login", "-u", "ana"]).unwrap();
        std::env::remove_var("SCPE_PASSWORD");

        match cli.command {
            Command::Login(auth) => {
                assert_eq!(auth.username, "ana");
                assert_eq!(auth.password, "from-env");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
