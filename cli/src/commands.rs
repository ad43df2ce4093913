//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored text
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for ballot
#[derive(Parser, Debug)]
#[command(name = "ballot")]
#[command(author, version, about = "Delegate apportionment, vote tallies and elections")]
#[command(long_about = r#"
Ballot runs the decision rules of a member organization: it apportions
delegate seats across groups, tallies votes on change requests and
settles elections.

Configuration files are loaded from (in priority order):
1. BALLOT_* environment variables (e.g. BALLOT_SESSION__QUORUM=0.6)
2. --config <path>     Explicit config file
3. ./ballot.toml       Project-level config
4. ~/.config/ballot/config.toml   Global config

Example:
  ballot apportion A=120 B=80 C=50 --total 5
  ballot tally --accept 7 --reject 3 --eligible 12 --majority two-thirds
  ballot election alice=4 bob=4 carol=1
  ballot finalize roster.toml --as chair
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apportion delegate seats across groups by membership
    Apportion {
        /// Groups as NAME=MEMBERS
        #[arg(value_name = "GROUP=MEMBERS", required = true, value_parser = parse_pair::<u64>)]
        groups: Vec<(String, u64)>,

        /// Seats to distribute (defaults to `delegates.total`)
        #[arg(short, long)]
        total: Option<u64>,
    },

    /// Apportion seats and confirm nominees from a roster file
    Finalize {
        /// TOML roster with `[conference]`, `[[groups]]` and `[[nominations]]`
        #[arg(value_name = "ROSTER")]
        roster: PathBuf,

        /// Acting user, checked against `[permissions]`
        #[arg(long = "as", value_name = "USER", default_value = "chair")]
        actor: String,
    },

    /// Evaluate a vote count against quorum and majority
    Tally {
        #[arg(long, default_value_t = 0)]
        accept: usize,

        #[arg(long, default_value_t = 0)]
        reject: usize,

        #[arg(long, default_value_t = 0)]
        abstain: usize,

        /// Number of eligible voters
        #[arg(short, long)]
        eligible: usize,

        /// Quorum fraction (defaults to `session.quorum`)
        #[arg(short, long)]
        quorum: Option<f64>,

        /// simple, absolute or two-thirds (defaults to `session.majority`)
        #[arg(short, long)]
        majority: Option<String>,
    },

    /// Determine an election winner from per-candidate counts
    Election {
        /// Candidates as NAME=VOTES
        #[arg(value_name = "CANDIDATE=VOTES", required = true, value_parser = parse_pair::<usize>)]
        candidates: Vec<(String, usize)>,

        /// Number of eligible voters (defaults to the votes cast)
        #[arg(short, long)]
        eligible: Option<usize>,

        /// simple, absolute or two-thirds (defaults to `election.majority`)
        #[arg(short, long)]
        majority: Option<String>,
    },

    /// Show configuration sources, effective values and issues
    ShowConfig,
}

/// Parse `NAME=N`.
fn parse_pair<T>(raw: &str) -> Result<(String, T), String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=N, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{}'", raw));
    }
    let value = value
        .trim()
        .parse::<T>()
        .map_err(|e| format!("invalid number in '{}': {}", raw, e))?;
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair::<u64>("A=120"), Ok(("A".to_string(), 120)));
        assert_eq!(parse_pair::<u64>(" B = 8 "), Ok(("B".to_string(), 8)));
        assert!(parse_pair::<u64>("A").is_err());
        assert!(parse_pair::<u64>("=3").is_err());
        assert!(parse_pair::<u64>("A=-1").is_err());
    }

    #[test]
    fn test_parse_apportion_command() {
        let cli = Cli::try_parse_from(["ballot", "-vv", "apportion", "A=3", "B=1", "--total", "2"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Apportion { groups, total } => {
                assert_eq!(groups.len(), 2);
                assert_eq!(total, Some(2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ballot", "tally", "--accept", "3", "--eligible", "5", "--output", "json",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
    }
}
