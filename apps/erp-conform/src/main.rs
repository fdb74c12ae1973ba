//! erp-conform CLI binary entry point.
//! Resolves configuration, runs validation and prints the report.

use clap::Parser;
use erp_conform::cli::{Cli, Commands};
use erp_conform::config::{self, CliOverrides, ColorMode};
use erp_conform::{lint, output, utils};
use std::process::exit;
use tracing::Level;

fn init_tracing(verbose: u8, ansi: bool) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate {
            root,
            format,
            fail_on,
            rules,
            config,
            color,
            verbose,
        } => {
            let overrides = CliOverrides {
                root,
                format,
                fail_on,
                rules,
                config,
                color: color.clone(),
            };
            // the flag alone decides error coloring when config cannot be read
            let early_color = match color.as_deref() {
                Some("always") => ColorMode::Always,
                Some("never") => ColorMode::Never,
                _ => ColorMode::Auto,
            };
            init_tracing(verbose, utils::stderr_color(early_color));
            let eff = match config::resolve_effective(&overrides) {
                Ok(eff) => eff,
                Err(e) => {
                    eprintln!("{} {}", utils::error_prefix(utils::stderr_color(early_color)), e);
                    exit(2);
                }
            };
            if eff.config_path.is_none() {
                tracing::info!("no erp-conform config found; using defaults");
            }
            match lint::run_validate(&eff) {
                Ok(report) => {
                    output::print_report(&report, eff.format, utils::stdout_color(eff.color));
                    exit(report.exit_code(eff.fail_on));
                }
                Err(e) => {
                    eprintln!("{} {}", utils::error_prefix(utils::stderr_color(eff.color)), e);
                    exit(2);
                }
            }
        }
    }
}
