mod commands;
mod helpers;

use clap::Parser;
use recovcls_core::domain::CheckError;

pub fn run_from_env() -> i32 {
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let check_error = error.as_check_error();
            eprintln!("{}", check_error.diagnostic_line());
            if let Some(summary_line) = check_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            check_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("check-recovcls".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing();
            commands::run_check_command(cli.check)
        }
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
    name = "check-recovcls",
    version,
    about = "Compare recovered angular power spectra against the simulation inputs"
)]
struct Cli {
    #[command(flatten)]
    check: commands::CheckArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Check(CheckError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_check_error(&self) -> CheckError {
        match self {
            Self::Usage(message) => {
                CheckError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Check(error) => error.clone(),
            Self::Internal(error) => CheckError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
