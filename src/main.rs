//! Easypay-Panel main entry point
//!
//! This is the command-line interface for the Easypay-Panel session tool.

use anyhow::Context;
use clap::{Parser, Subcommand};
use easypay_panel::config::{load_config, Config};
use easypay_panel::{AdminIdentity, Credentials, PanelClient, QueryIdentity};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Easypay-Panel: log into the admin panel and scrape its reports
///
/// Every command prints a JSON envelope `{result, message, data}` and exits with
/// status 0 only when `result` is true.
#[derive(Parser, Debug)]
#[command(name = "easypay-panel")]
#[command(version)]
#[command(about = "Session automation for the Easypay admin panel", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in (solving the captcha) and persist the new session
    Login,

    /// Check whether the persisted session is still accepted
    Status,

    /// Fetch and parse one report page
    Report {
        /// Report path, overriding `[report].path`
        #[arg(long)]
        path: Option<String>,

        /// Extra query parameter as key=value; repeatable, overrides `[report.query]`
        #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_query_pair)]
        query: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let client = PanelClient::from_config(&config);
    let admin = AdminIdentity::new(
        config.account.admin_name.clone(),
        config.account.admin_id.clone(),
    );

    let succeeded = match cli.command {
        Command::Login => {
            let credentials = Credentials::new(
                config.account.username.clone(),
                config.account.password.clone(),
            );
            let identity = QueryIdentity::new(
                config.site.query_key.clone(),
                config.site.query_value.clone(),
            );
            print_envelope(&client.login(&credentials, &identity).await)?
        }
        Command::Status => print_envelope(&client.check_login_status(&admin).await)?,
        Command::Report { path, query } => {
            let (path, query) = report_request(&config, path, query)?;
            print_envelope(&client.fetch_report(&path, &query, &admin).await)?
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("easypay_panel=info,warn"),
            1 => EnvFilter::new("easypay_panel=debug,info"),
            2 => EnvFilter::new("easypay_panel=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout carries the envelope; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves the report path and query from the config and command-line overrides
fn report_request(
    config: &Config,
    path: Option<String>,
    overrides: Vec<(String, String)>,
) -> anyhow::Result<(String, Vec<(String, String)>)> {
    let mut query = config
        .report
        .as_ref()
        .map(|report| report.query.clone())
        .unwrap_or_default();
    query.extend(overrides);

    let path = path
        .or_else(|| config.report.as_ref().map(|report| report.path.clone()))
        .context("no report path: pass --path or set [report].path")?;

    Ok((path, query.into_iter().collect()))
}

fn parse_query_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

/// Prints an envelope as pretty JSON and returns its `result` flag
fn print_envelope<T: Serialize>(envelope: &easypay_panel::Envelope<T>) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(envelope.is_success())
}
