mod checksum;
mod cli;
mod diff;
mod dir_list;
mod manifest;
mod policy;
mod reconcile;
mod report;
mod stats;

use checksum::{ExternalHasher, Md5Hasher};
use cli::{Cli, LogLevel};
use reconcile::{Reconciler, RunOptions};
use report::TerminalConsole;
use stats::{RunStats, SharedStats};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr, stdout};
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct CheckExitCode;

impl CheckExitCode {
    /// Exit code used when a fail policy triggered or any error occurred.
    fn failure() -> ExitCode {
        ExitCode::from(1)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    let result = if cli.directories.is_empty() {
        Cli::print_help()
            .map(|()| ExitCode::SUCCESS)
            .map_err(anyhow::Error::from)
    } else {
        run(cli)
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err}");
            CheckExitCode::failure()
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let policy = cli.policy();
    print!("{}", policy.to_toml()?);

    let use_colors = !cli.no_color && stdout().is_terminal();
    let options = RunOptions {
        safe_mode: cli.safe_mode,
    };

    let mut stats = RunStats::new();
    let shared = SharedStats::new(stats);
    install_interrupt_handler(shared.clone())?;

    let mut console = TerminalConsole::stdio(use_colors);
    match cli.hash_program {
        Some(program) => {
            info!("Hashing with external program {}", program);
            let hasher = ExternalHasher { program };
            Reconciler::new(&policy, options, &hasher, &mut console)
                .with_shared_stats(shared)
                .run(&cli.directories, &mut stats)?
        }
        None => Reconciler::new(&policy, options, &Md5Hasher, &mut console)
            .with_shared_stats(shared)
            .run(&cli.directories, &mut stats)?,
    }

    for line in stats.summary_lines() {
        println!("{line}");
    }

    Ok(ExitCode::SUCCESS)
}

/// Ctrl-C prints the statistics of the directories hashed so far and exits
/// successfully. Manifests are replaced atomically, so none is left half
/// written.
fn install_interrupt_handler(shared: SharedStats) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        println!();
        println!("Job cancelling due to keyboard interrupt...");
        for line in shared.snapshot().summary_lines() {
            println!("{line}");
        }
        std::process::exit(0);
    })?;
    Ok(())
}

fn init_tracing(verbose: u8, log_level: Option<LogLevel>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = match log_level {
        Some(level) => EnvFilter::new(level.directive()),
        None if verbose > 0 => EnvFilter::new(default_level),
        None => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
        }
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
