//! schema-gen - OpenAPI v3 schemas for Helm chart values

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "schema-gen")]
#[command(author = "Schemagen Contributors")]
#[command(about = "Generate an OpenAPI v3 schema from a Helm values file", long_about = None)]
struct Cli {
    /// Local values file
    #[arg(required_unless_present = "repo", conflicts_with = "repo")]
    values_file: Option<PathBuf>,

    /// Chart repository URL
    #[arg(long, requires = "chart")]
    repo: Option<String>,

    /// Chart name in the repository
    #[arg(long, requires = "repo")]
    chart: Option<String>,

    /// Chart version or semver constraint (latest stable when omitted)
    #[arg(long = "version", requires = "chart")]
    chart_version: Option<String>,

    /// Fetch timeout in seconds
    #[arg(long, env = "SCHEMAGEN_TIMEOUT", default_value_t = 30.0)]
    timeout: f64,

    /// Repository username
    #[arg(long, env = "SCHEMAGEN_USERNAME", requires = "password", hide_env_values = true)]
    username: Option<String>,

    /// Repository password
    #[arg(long, env = "SCHEMAGEN_PASSWORD", requires = "username", hide_env_values = true)]
    password: Option<String>,

    /// Write the schema to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(exit_codes::USAGE_ERROR);
        }
        Err(e) => e.exit(),
    };

    init_logging(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Logs go to stderr, stdout is reserved for the schema
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let output = cli.output.as_deref();

    if let Some(path) = &cli.values_file {
        return commands::generate::run_file(path, output);
    }

    let (Some(repo), Some(chart)) = (&cli.repo, &cli.chart) else {
        return Err(CliError::input(
            "either a values file or --repo and --chart is required",
        ));
    };

    let options = commands::fetch::FetchOptions {
        timeout: std::time::Duration::try_from_secs_f64(cli.timeout)
            .map_err(|_| CliError::input(format!("invalid timeout: {} seconds", cli.timeout)))?,
        username: cli.username,
        password: cli.password,
    };
    let version = cli.chart_version.as_deref().unwrap_or_default();
    let values = commands::fetch::run(repo, chart, version, options)?;

    commands::generate::run(&values, output)
}
