#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Command-line interface for running a shell command over jj changes via the libjjrun crate.

use std::{
    io::{self, IsTerminal, Write},
    process,
    sync::Arc,
};

use anyhow::{Error, Result};
use clap::Parser;
use libjjrun::{Jj, JjRunError, RunRequest, Runner};
use liboutput::{Output, Quiet, Terminal};
use tracing::debug;

/// Command-line argument definitions.
mod args;
/// Settings resolution from flags, environment and defaults.
mod config;
/// Diagnostic log setup.
mod logging;
/// Rendering of run progress and summaries.
mod ui;
/// Small path helpers.
mod utils;

use args::Cli;
use config::Settings;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Determine color output preference early for error handling
    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        io::stdout().is_terminal()
    };

    let output: Arc<dyn Output> = if cli.quiet {
        Arc::new(Quiet)
    } else {
        Arc::new(Terminal::new(color))
    };

    if let Err(e) = run(&cli, output.as_ref()) {
        // Reset any existing colors only if color was enabled and stdout is a TTY
        if color && io::stdout().is_terminal() {
            print!("\x1b[0m");
            if let Err(flush_err) = io::stdout().flush() {
                eprintln!("Failed to flush stdout while resetting colors: {flush_err}");
            }
        }

        let exit_code = match e.downcast_ref::<JjRunError>() {
            // Already reported as the failing change was processed.
            Some(err @ (JjRunError::CommandExit { .. } | JjRunError::Stopped { .. })) => {
                err.exit_code()
            }
            Some(err) => {
                report_error(output.as_ref(), &e);
                err.exit_code()
            }
            None => {
                report_error(output.as_ref(), &e);
                1
            }
        };

        process::exit(exit_code);
    }
    Ok(())
}

/// Show a top-level error through the output handler.
fn report_error(output: &dyn Output, e: &Error) {
    if let Err(display_err) = output.fail(&format!("{e:#}")) {
        eprintln!("Failed to report error via output handler: {display_err:#}");
    }
    if let Err(finish_err) = output.finish() {
        eprintln!("Failed to flush output handler: {finish_err:#}");
    }
}

/// Resolve settings, run the command over the selected changes and report.
fn run(cli: &Cli, output: &dyn Output) -> Result<()> {
    let settings = Settings::from_env(cli)?;
    debug!(?settings, "resolved settings");

    let jj = Jj::new(
        settings.jj.as_str(),
        settings.shell.as_str(),
        settings.repo_dir.clone(),
    );
    let runner = Runner::new(jj, settings.tmp_dir);
    let request = RunRequest {
        selection: cli.revset.clone(),
        command: cli.user_command(),
        strategy: cli.err_strategy.into(),
    };

    let observer = ui::TerminalObserver::new(output);
    let report = runner.run(&request, &observer)?;

    ui::render_summary(output, &report);
    ui::emit(output.finish());
    report.status()?;
    Ok(())
}
