mod help_text;

use crate::policy::{Action, MissingAction, Policy, Preset};
use clap::{Arg, ArgAction, CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Verify and maintain per-directory md5 checksum files
#[derive(Parser, Debug)]
#[command(
    name = "checktree",
    version,
    about,
    long_about = help_text::ROOT_LONG_ABOUT,
    after_long_help = help_text::POLICY_HELP,
    disable_version_flag = true,
    arg = Arg::new("version")
        .long("version")
        .action(ArgAction::Version)
        .help("Print version")
)]
pub struct Cli {
    /// Directories to process, each one recursively
    #[arg(value_name = "DIRECTORY")]
    pub directories: Vec<PathBuf>,

    /// What to do with renamed files
    #[arg(short, long, value_enum, value_name = "ACTION", default_value_t = Action::Show)]
    pub renames: Action,

    /// What to do with directories that have no checksum file
    #[arg(short, long, value_enum, value_name = "ACTION", default_value_t = MissingAction::Ignore)]
    pub missing: MissingAction,

    /// What to do with files not in the checksum file
    #[arg(short, long, value_enum, value_name = "ACTION", default_value_t = Action::Prompt)]
    pub new: Action,

    /// What to do with files that disappeared
    #[arg(short, long, value_enum, value_name = "ACTION", default_value_t = Action::Prompt)]
    pub deletes: Action,

    /// What to do with files whose checksum changed
    #[arg(short, long, value_enum, value_name = "ACTION", default_value_t = Action::Prompt)]
    pub updates: Action,

    /// Update everything without asking, creating missing checksum files
    #[arg(short = 'A', long)]
    pub autoupdate_all: bool,

    /// Only report differences, never write
    #[arg(short = 'V', long)]
    pub verify_all: bool,

    /// Record renames and new files, ask about changed and deleted files
    #[arg(short = 'R', long)]
    pub refresh_all: bool,

    /// Ask before every update, creating missing checksum files
    #[arg(short = 'U', long)]
    pub update_all: bool,

    /// Ask before every update and before creating checksum files
    #[arg(short = 'P', long)]
    pub prompt_all: bool,

    /// Never write checksum files, report what would have been written
    #[arg(short, long)]
    pub safe_mode: bool,

    /// Hash with an external md5sum compatible program instead of in-process
    #[arg(long, value_name = "PROGRAM")]
    pub hash_program: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Increase logging verbosity (-v for info, -vv for debug). Takes precedence over RUST_LOG.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Set the log level. Takes precedence over RUST_LOG.
    #[arg(long, value_enum, value_name = "LEVEL", conflicts_with = "verbose")]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn print_help() -> std::io::Result<()> {
        <Self as CommandFactory>::command().print_help()
    }

    pub fn presets(&self) -> Vec<Preset> {
        [
            (self.autoupdate_all, Preset::AutoupdateAll),
            (self.verify_all, Preset::VerifyAll),
            (self.refresh_all, Preset::RefreshAll),
            (self.update_all, Preset::UpdateAll),
            (self.prompt_all, Preset::PromptAll),
        ]
        .into_iter()
        .filter_map(|(set, preset)| set.then_some(preset))
        .collect()
    }

    /// The per-category policies as given, before presets.
    pub fn explicit_policy(&self) -> Policy {
        Policy {
            renames: self.renames,
            missing: self.missing,
            new: self.new,
            deletes: self.deletes,
            updates: self.updates,
        }
    }

    pub fn policy(&self) -> Policy {
        Policy::resolve(self.explicit_policy(), &self.presets())
    }
}
