//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no I/O happens here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use depaudit_graph::DEFAULT_MAX_APPEARANCES;

/// depaudit -- dependency graph and source security scanning.
///
/// Use `depaudit <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "depaudit", version, about, long_about = None)]
pub struct Cli {
    /// Path to the depaudit.toml configuration file.
    #[arg(short, long, global = true, default_value = "depaudit.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build dependency trees from an edge file and compute impact paths.
    Graph(GraphArgs),

    /// Run the source code scanners (applicability, secrets, IaC, SAST).
    Jas(JasArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- graph ----

/// Build dependency trees from a JSON edge file.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// JSON file with `technology` and per-module `root_id`/`edges`/`known_ids`.
    pub edges: PathBuf,

    /// Component id to compute impact paths for (repeatable).
    #[arg(long = "target", value_name = "ID")]
    pub targets: Vec<String>,

    /// How many times a single id may be expanded within one tree.
    #[arg(long, default_value_t = DEFAULT_MAX_APPEARANCES)]
    pub max_appearances: usize,
}

// ---- jas ----

/// Run the analysis engine over the configured modules.
#[derive(Args, Debug)]
pub struct JasArgs {
    /// Directory to scan as a module (repeatable). Overrides `jas.working_dirs`.
    #[arg(long = "working-dir", value_name = "DIR")]
    pub working_dirs: Vec<String>,

    /// CVE of a direct dependency to check for applicability (repeatable).
    #[arg(long = "cve", value_name = "CVE")]
    pub cves: Vec<String>,

    /// CVE of an indirect dependency to check for applicability (repeatable).
    #[arg(long = "indirect-cve", value_name = "CVE")]
    pub indirect_cves: Vec<String>,

    /// Scanner to run (applicability, secrets, iac, sast). Repeatable; default is all.
    #[arg(long = "scanner", value_name = "TYPE")]
    pub scanners: Vec<String>,

    /// Check applicability in third-party code as well.
    #[arg(long)]
    pub third_party: bool,

    /// Override the analyzer engine executable.
    #[arg(long)]
    pub analyzer_manager: Option<String>,

    /// Per-invocation engine deadline in seconds (0 = none).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Identifier grouping several scans on the platform side.
    #[arg(long)]
    pub multi_scan_id: Option<String>,
}

// ---- config ----

/// Manage depaudit configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, server, jas, binary_scan).
        #[arg(long)]
        section: Option<String>,
    },
}
