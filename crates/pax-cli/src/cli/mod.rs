mod commands;

use clap::Parser;
use pax_core::domain::{PaxError, PaxErrorCategory};

pub fn run_from_env() -> i32 {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("pax-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(name = "pax-rs", about = "PAX spectral simulation and recovery pipeline")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Simulate PAX spectra and fit the cross-validated width grid
    Run(commands::RunArgs),
    /// Trace per-width convergence against ground truth and a validation set
    AssessConvergence(commands::AssessConvergenceArgs),
    /// Print the parameters of a stored result
    Describe(commands::DescribeArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Run(args) => commands::run_command(args),
        CliCommand::AssessConvergence(args) => commands::assess_convergence_command(args),
        CliCommand::Describe(args) => commands::describe_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(PaxError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => PaxErrorCategory::Configuration.exit_code(),
            Self::Compute(error) => error.exit_code(),
            Self::Internal(_) => PaxErrorCategory::Io.exit_code(),
        }
    }

    pub fn diagnostic_line(&self) -> String {
        match self {
            Self::Usage(message) => {
                format!("ERROR: [{}] {message}", PaxErrorCategory::Configuration.as_str())
            }
            Self::Compute(error) => error.diagnostic_line(),
            Self::Internal(error) => {
                format!("ERROR: [{}] {error:#}", PaxErrorCategory::Io.as_str())
            }
        }
    }
}
