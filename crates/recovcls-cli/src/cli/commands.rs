use super::CliError;
use super::helpers::{current_working_dir, resolve_cli_path};
use recovcls_core::numerics::RemainderPolicy;
use recovcls_core::pipeline::{
    CheckOptions, CheckRequest, ConvergenceAnswer, ConvergenceSpectraResolver,
    DEFAULT_BIN_WIDTH, DEFAULT_RESIDUAL_BIN_WIDTH, PresetAnswer, RunSummary, TerminalPrompt,
    render_human_summary, run_check,
};
use anyhow::Context;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct CheckArgs {
    /// Simulation config file used for the run
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Prefix of already computed convergence Cls; skips the interactive question
    #[arg(long, value_name = "PREFIX")]
    kappa_cls: Option<String>,

    /// Tabulated pixel window (one W_l per line, or "l W_l") used instead of the computed one
    #[arg(long, value_name = "PATH")]
    pixwin_table: Option<PathBuf>,

    /// Multipole bin width for the recovered spectrum
    #[arg(long, default_value_t = DEFAULT_BIN_WIDTH)]
    bin_width: usize,

    /// Multipole bin width for the fractional residual
    #[arg(long, default_value_t = DEFAULT_RESIDUAL_BIN_WIDTH)]
    residual_bin_width: usize,

    /// Keep trailing multipoles by merging them into the last bin
    #[arg(long)]
    fold_remainder: bool,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,
}

impl CheckArgs {
    fn into_request(self, working_dir: PathBuf) -> (CheckRequest, Option<String>) {
        let options = CheckOptions {
            bin_width: self.bin_width,
            residual_bin_width: self.residual_bin_width,
            remainder_policy: if self.fold_remainder {
                RemainderPolicy::FoldIntoLast
            } else {
                RemainderPolicy::Drop
            },
            pixwin_table: self
                .pixwin_table
                .map(|path| resolve_cli_path(&working_dir, &path)),
            summary_path: self
                .summary
                .map(|path| resolve_cli_path(&working_dir, &path)),
        };
        let config_path = resolve_cli_path(&working_dir, &self.config);
        let request = CheckRequest::new(config_path, working_dir).with_options(options);
        (request, self.kappa_cls)
    }
}

pub(super) fn run_check_command(args: CheckArgs) -> Result<i32, CliError> {
    let working_dir = current_working_dir().map_err(CliError::Check)?;
    let (request, kappa_cls) = args.into_request(working_dir);
    tracing::debug!(config = %request.config_path.display(), options = ?request.options, "starting check");

    let summary = match kappa_cls {
        Some(prefix) => {
            let mut resolver = PresetAnswer(ConvergenceAnswer::Precomputed(prefix));
            run_with(&request, &mut resolver)?
        }
        None => {
            let mut resolver = TerminalPrompt::new(io::stdin().lock(), io::stdout());
            run_with(&request, &mut resolver)?
        }
    };

    println!("{}", render_human_summary(&summary));
    if let Some(path) = &request.options.summary_path {
        println!("JSON summary: {}", path.display());
    }
    io::stdout().flush().context("failed to flush run summary")?;
    Ok(0)
}

fn run_with(
    request: &CheckRequest,
    resolver: &mut dyn ConvergenceSpectraResolver,
) -> Result<RunSummary, CliError> {
    run_check(request, resolver).map_err(CliError::Check)
}
