mod commands;
mod helpers;

use clap::Parser;
use xps_synth_core::domain::XpsError;

pub fn run_from_env() -> i32 {
    helpers::init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_xps_error();
            eprintln!("{}", error.diagnostic_line());
            eprintln!("{}", error.fatal_exit_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("xps-synth".to_string())
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

#[derive(Parser)]
#[command(
    name = "xps-synth",
    version,
    about = "Synthetic XPS spectra dataset generator"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Generate a dataset from reference spectra and optionally export it
    Generate(commands::GenerateArgs),
    /// Print the sampled augmentation matrix as JSON
    Sample(commands::SampleArgs),
    /// Generate a dataset and store it as a document collection
    Upload(commands::UploadArgs),
    /// Remove a document collection from the store
    Drop(commands::DropArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Generate(args) => commands::run_generate_command(args),
        CliCommand::Sample(args) => commands::run_sample_command(args),
        CliCommand::Upload(args) => commands::run_upload_command(args),
        CliCommand::Drop(args) => commands::run_drop_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(XpsError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<XpsError> for CliError {
    fn from(error: XpsError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_xps_error(&self) -> XpsError {
        match self {
            Self::Usage(message) => XpsError::configuration("CONFIG.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => XpsError::internal("SYS.CLI", format!("{error:#}")),
        }
    }
}
