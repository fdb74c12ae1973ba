//! CLI argument parsing via `clap`.

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "erp-conform",
    version,
    about = "Architecture conformance validator for ERP microservice trees",
    long_about = "erp-conform — validate that an ERP microservice project follows the layered module standard: module layout and naming, layering, centralized constants and environment access, the error hierarchy, and schema/migration conventions.\n\nConfiguration precedence: CLI > erp-conform.toml > defaults.",
    after_help = "Examples:\n  erp-conform validate ./services/inventory\n  erp-conform validate . --format json --fail-on warning\n  erp-conform validate . --rules naming,layering -v",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current erp-conform version."
    )]
    Version,
    /// Validate a project tree
    #[command(
        about = "Validate a project tree",
        long_about = "Scan the project, build its structural model, run every enabled rule and print a report. Exit code 0 when clean, 1 when violations reach the --fail-on threshold, 2 on a fatal error.",
        after_help = "Examples:\n  erp-conform validate .\n  erp-conform validate ./svc --format json\n  erp-conform validate ./svc --config ci/erp-conform.yaml --color never"
    )]
    Validate {
        #[arg(help = "Project root to validate")]
        root: String,
        #[arg(long, help = "Output format: text|json (default: text)")]
        format: Option<String>,
        #[arg(long, help = "Lowest severity that fails the run: warning|error (default: error)")]
        fail_on: Option<String>,
        #[arg(long, help = "Comma-separated rule ids to run (default: all)")]
        rules: Option<String>,
        #[arg(long, help = "Path to a config file (default: erp-conform.{toml,yaml,yml} in root)")]
        config: Option<String>,
        #[arg(long, help = "Colorize output: auto|always|never (default: auto)")]
        color: Option<String>,
        #[arg(short, long, action = ArgAction::Count, help = "Log progress to stderr (-v info, -vv debug)")]
        verbose: u8,
    },
}
