mod cli;
mod config;
mod error;
mod scan;
mod splitter;
mod ui;

use std::ffi::OsString;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use cli::{Cli, normalize_args};
use config::LayerchopConfig;
use env_logger::Env;
use error::LayerchopError;
use scan::JobRequest;
use ui::ScanProgress;

/// What the command line asks for.
enum Invocation {
    Run(Cli, JobRequest),
    /// `--help` or `--version`; clap prints and exits.
    Exit(clap::Error),
    Usage(UsageFailure),
}

/// A rejected command line: a reason on stderr, the syntax text on stdout.
#[derive(Debug)]
struct UsageFailure {
    stderr: String,
    stdout: String,
    status: u8,
}

impl UsageFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            stderr: reason.into(),
            stdout: cli::syntax(),
            status: 1,
        }
    }

    fn report(self) -> ExitCode {
        eprintln!("{}", self.stderr.trim_end());
        print!("{}", self.stdout);
        ExitCode::from(self.status)
    }
}

fn parse_invocation<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let cli = match Cli::try_parse_from(normalize_args(args)) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Invocation::Exit(err);
        }
        Err(err) => return Invocation::Usage(UsageFailure::new(err.to_string())),
    };
    match JobRequest::from_cli(&cli) {
        Ok(request) => Invocation::Run(cli, request),
        Err(LayerchopError::Usage(reason)) => Invocation::Usage(UsageFailure::new(reason)),
        Err(err) => Invocation::Usage(UsageFailure::new(err.to_string())),
    }
}

fn main() -> ExitCode {
    let (cli, request) = match parse_invocation(std::env::args_os()) {
        Invocation::Run(cli, request) => (cli, request),
        Invocation::Exit(err) => err.exit(),
        Invocation::Usage(failure) => return failure.report(),
    };

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    match run(&cli, &request) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("layerchop:\n  {err:#}\n");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, request: &JobRequest) -> anyhow::Result<()> {
    let config = LayerchopConfig::load(cli.config.as_deref())?;
    let progress = if cli.json {
        ScanProgress::hidden()
    } else {
        ScanProgress::new()
    };

    let summary = splitter::run(request, &config.markers, &progress)?;
    if cli.json {
        progress.print_json(&summary)?;
    } else {
        progress.print_summary(&summary);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(args: &[&str]) -> UsageFailure {
        match parse_invocation(args.iter().copied()) {
            Invocation::Usage(failure) => failure,
            Invocation::Run(..) => panic!("expected a usage failure, got a runnable job"),
            Invocation::Exit(err) => panic!("expected a usage failure, got {:?}", err.kind()),
        }
    }

    #[test]
    fn missing_ordinal_prints_syntax_and_fails() {
        let failure = usage(&["layerchop", "-count=3", "Model.gcode"]);
        assert_eq!(failure.status, 1);
        assert_eq!(failure.stdout, cli::syntax());
        assert!(failure.stdout.starts_with("Syntax: layerchop"));
        assert!(failure.stderr.contains("--ordinal"));
    }

    #[test]
    fn conflicting_bounds_print_syntax_and_fail() {
        let failure = usage(&["layerchop", "-info", "-end", "-to=4", "Model.gcode"]);
        assert_eq!(failure.status, 1);
        assert_eq!(failure.stdout, cli::syntax());
    }

    #[test]
    fn wrong_argument_count_prints_syntax_and_fails() {
        assert_eq!(usage(&["layerchop", "-info"]).status, 1);
        assert_eq!(usage(&["layerchop", "-info", "a.gcode", "b.gcode"]).status, 1);
    }

    #[test]
    fn valid_arguments_yield_a_job() {
        match parse_invocation(["layerchop", "-from=2", "-ordinal=1", "-count=2", "/p/M.gcode"]) {
            Invocation::Run(cli, request) => {
                assert_eq!(cli.from, Some(2));
                assert_eq!(
                    request.output.as_deref(),
                    Some(std::path::Path::new("/p/M_1of2.gcode"))
                );
            }
            _ => panic!("expected a runnable job"),
        }
    }

    #[test]
    fn help_is_left_to_clap() {
        assert!(matches!(
            parse_invocation(["layerchop", "--help"]),
            Invocation::Exit(_)
        ));
    }
}
