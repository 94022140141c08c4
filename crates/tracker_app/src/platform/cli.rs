//! CLI argument parsing with clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracker_core::SolveForm;
use tracker_engine::credential_digest;

use super::config::{TrackerConfig, DEFAULT_CONFIG_FILENAME};

/// Submit word-permutation solve jobs to a solver server and follow them to completion
#[derive(Debug, Parser)]
#[command(name = "solve-tracker", version, propagate_version = true)]
pub struct Cli {
    /// Tracker configuration file (RON)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Solver server base URL, overriding the config file
    #[arg(long, global = true, env = "SOLVE_TRACKER_URL")]
    pub base_url: Option<String>,

    /// Poll cadence in milliseconds, overriding the config file
    #[arg(long, global = true)]
    pub interval_ms: Option<u64>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a solve job and track it; Ctrl-C requests cancellation
    Solve(SolveArgs),

    /// Track an operation this session did not submit
    Attach {
        /// Operation id, as shown by `list`
        id: String,
    },

    /// Show operations currently running on the server
    List,

    /// Show server environment information
    Info,
}

#[derive(Debug, Args)]
pub struct SolveArgs {
    /// Letters to permute
    #[arg(default_value = "")]
    pub input: String,

    /// Pattern solutions must match (empty means [A-Z]+)
    #[arg(long, default_value = "")]
    pub regex: String,

    /// Minimum solution length
    #[arg(long, default_value = "")]
    pub min_chars: String,

    /// Ask the server to solve in parallel mode
    #[arg(long)]
    pub parallel: bool,

    /// Password whose digest authorizes the job
    #[arg(long, env = "SOLVE_TRACKER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut TrackerConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poll_interval_ms = interval_ms;
        }
    }
}

impl SolveArgs {
    pub fn to_form(&self) -> SolveForm {
        SolveForm {
            input: self.input.clone(),
            regex: self.regex.clone(),
            min_chars: self.min_chars.clone(),
            parallel_mode: self.parallel,
            credential_digest: self.password.as_deref().map(credential_digest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn solve_args_build_form_with_digest() {
        let cli = Cli::parse_from([
            "solve-tracker",
            "solve",
            "ABCXYZ",
            "--min-chars",
            "3",
            "--parallel",
            "--password",
            "password",
        ]);
        let Command::Solve(args) = cli.command else {
            panic!("expected solve");
        };
        let form = args.to_form();
        assert_eq!(form.input, "ABCXYZ");
        assert_eq!(form.min_chars, "3");
        assert!(form.parallel_mode);
        assert_eq!(
            form.credential_digest.as_deref(),
            Some("5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8")
        );
    }

    #[test]
    fn global_flags_override_config() {
        let cli = Cli::parse_from([
            "solve-tracker",
            "--base-url",
            "http://solver.internal:9000",
            "--interval-ms",
            "250",
            "list",
        ]);
        let mut config = TrackerConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.base_url, "http://solver.internal:9000");
        assert_eq!(config.poll_interval_ms, 250);
    }
}
