//! CLI entrypoint for ballot
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod output;
mod roster;

use anyhow::{Context, Result, anyhow, bail};
use ballot_application::{
    AllowAll, AuditLog, FinalizeDelegatesUseCase, NoAuditLog, PermissionChecker,
};
use ballot_domain::core::validation::has_errors;
use ballot_domain::{
    CandidateTally, ConferenceId, GroupMembership, MajorityType, QuorumFraction, TallyOutcome,
    TallyRule, UserId, VoteCount, apportion, calculate_election_winner,
};
use ballot_infrastructure::{
    ConfigLoader, FileConfig, JsonlAuditLog, MemoryStore, StaticPermissions,
};
use clap::Parser;
use commands::{Cli, Command, OutputFormat};
use output::ConsoleFormatter;
use roster::Roster;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    let _guard = init_logging(cli.verbose, log_file.as_deref())?;
    info!("Starting ballot");

    let issues = config.validate();
    if !matches!(cli.command, Command::ShowConfig) && !issues.is_empty() {
        eprint!("{}", ConsoleFormatter::format_issues(&issues));
        if has_errors(&issues) {
            bail!("Configuration has errors; fix them or run with --no-config");
        }
    }

    match cli.command {
        Command::Apportion { groups, total } => {
            let total = total
                .or(config.delegates.total)
                .context("No seat count: pass --total or set delegates.total")?;
            let memberships: Vec<GroupMembership> = groups
                .iter()
                .map(|(name, members)| GroupMembership::new(name.as_str(), *members))
                .collect();
            let result = apportion(&memberships, total)?;
            match cli.output {
                OutputFormat::Text => print!("{}", ConsoleFormatter::format_apportionment(&result)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
        }

        Command::Finalize { roster, actor } => {
            finalize(&config, &roster, &actor, cli.output).await?;
        }

        Command::Tally {
            accept,
            reject,
            abstain,
            eligible,
            quorum,
            majority,
        } => {
            let (params, _) = config.session.to_session_params();
            let quorum = match quorum {
                Some(q) => QuorumFraction::new(q)?,
                None => params.quorum,
            };
            let majority = match majority {
                Some(m) => m.parse::<MajorityType>().map_err(|e| anyhow!(e))?,
                None => params.majority,
            };

            let count = VoteCount {
                accept,
                reject,
                abstain,
                total: accept + reject + abstain,
            };
            if count.total > eligible {
                warn!("{} votes cast but only {} eligible", count.total, eligible);
            }
            let outcome = TallyOutcome::evaluate(count, &TallyRule::new(quorum, majority, eligible));
            match cli.output {
                OutputFormat::Text => print!("{}", ConsoleFormatter::format_tally(&outcome)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
            }
        }

        Command::Election {
            candidates,
            eligible,
            majority,
        } => {
            let majority = match majority {
                Some(m) => m.parse::<MajorityType>().map_err(|e| anyhow!(e))?,
                None => config.election.parse_majority().0,
            };
            let tallies: Vec<CandidateTally> = candidates
                .iter()
                .map(|(name, votes)| CandidateTally::new(name.as_str(), *votes))
                .collect();
            let eligible = eligible.unwrap_or_else(|| tallies.iter().map(|t| t.votes).sum());

            let outcome = calculate_election_winner(&tallies, majority, eligible);
            match cli.output {
                OutputFormat::Text => print!("{}", ConsoleFormatter::format_election(&outcome)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
            }
        }

        Command::ShowConfig => {
            println!("Configuration sources (in priority order):");
            for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
                println!("  {}", line);
            }
            println!();
            println!("{}", toml::to_string_pretty(&config)?);
            if issues.is_empty() {
                println!("No issues found.");
            } else {
                print!("{}", ConsoleFormatter::format_issues(&issues));
            }
        }
    }

    Ok(())
}

/// Initialize logging based on verbosity level, optionally mirrored to a file.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn finalize(
    config: &FileConfig,
    roster_path: &Path,
    actor: &str,
    format: OutputFormat,
) -> Result<()> {
    let roster = Roster::load(roster_path)?;
    let total = roster
        .conference
        .total
        .or(config.delegates.total)
        .context("No seat count: set conference.total in the roster or delegates.total")?;

    let store = Arc::new(MemoryStore::new());
    roster.seed(&store, total).await;

    let permissions: Arc<dyn PermissionChecker> =
        if config.permissions.managers.is_empty() && config.permissions.grants.is_empty() {
            debug!("No permission table configured; every actor is allowed");
            Arc::new(AllowAll)
        } else {
            Arc::new(StaticPermissions::from_config(&config.permissions).0)
        };

    let audit: Arc<dyn AuditLog> = match config.audit.resolved_path() {
        Some(path) => match JsonlAuditLog::open(&path) {
            Ok(log) => Arc::new(log),
            Err(e) => {
                warn!("Audit log disabled: {}", e);
                Arc::new(NoAuditLog)
            }
        },
        None => Arc::new(NoAuditLog),
    };

    let use_case =
        FinalizeDelegatesUseCase::new(store.clone(), permissions, store).with_audit(audit);
    let result = use_case
        .execute(
            &UserId::new(actor),
            &ConferenceId::new(roster.conference.id.as_str()),
        )
        .await?;

    match format {
        OutputFormat::Text => print!("{}", ConsoleFormatter::format_finalize(&result)),
        OutputFormat::Json => {
            let value = json!({
                "conference_id": result.conference_id,
                "apportionment": result.apportionment,
                "decisions": result.decisions,
                "finalized_at": result.finalized_at,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
