//! User facing output and confirmation prompts.
//!
//! The reconciler talks to the user only through [`Console`], so it can be
//! driven by a scripted console in tests. [`TerminalConsole`] is the real
//! implementation: colored lines on stdout and `y`/`n` answers on stdin.

use crate::diff::{HashChange, Rename};
use colored::{ColoredString, Colorize};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::SystemTime;

/// Status tag printed in front of each directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryTag {
    Empty,
    Verify,
    NoFile,
    Create,
}

impl DirectoryTag {
    pub fn label(self) -> &'static str {
        match self {
            DirectoryTag::Empty => "[EMPTY]",
            DirectoryTag::Verify => "[VERIFY]",
            DirectoryTag::NoFile => "[NOFILE]",
            DirectoryTag::Create => "[CREATE]",
        }
    }
}

/// One category of differences found in a directory.
#[derive(Debug, Clone, Copy)]
pub enum Listing<'a> {
    Updated(&'a BTreeMap<String, HashChange>),
    Renamed(&'a [Rename]),
    Added(&'a BTreeMap<String, String>),
    Removed(&'a BTreeMap<String, String>),
}

impl Listing<'_> {
    /// Header followed by one line per entry, without indentation.
    pub fn lines(&self) -> Vec<String> {
        let (title, len) = match self {
            Listing::Updated(files) => ("UPDATED FILES", files.len()),
            Listing::Renamed(renames) => ("RENAMED FILES", renames.len()),
            Listing::Added(files) => ("NEW FILES", files.len()),
            Listing::Removed(files) => ("MISSING FILES", files.len()),
        };

        let mut lines = vec![format!("{} ({})", title, crate::stats::format_count(len as u64))];

        match self {
            Listing::Updated(files) => lines.extend(
                files
                    .iter()
                    .map(|(name, change)| format!("{} -> {} {}", change.old, change.new, name)),
            ),
            Listing::Renamed(renames) => lines.extend(
                renames
                    .iter()
                    .map(|r| format!("{} \"{}\" -> \"{}\"", r.hash, r.old_name, r.new_name)),
            ),
            Listing::Added(files) | Listing::Removed(files) => lines.extend(
                files
                    .iter()
                    .map(|(name, hash)| format!("{} {}", hash, name)),
            ),
        }

        lines
    }

    fn paint(&self, text: &str) -> ColoredString {
        match self {
            Listing::Updated(_) => text.yellow(),
            Listing::Renamed(_) => text.bright_cyan(),
            Listing::Added(_) => text.green(),
            Listing::Removed(_) => text.red(),
        }
    }
}

/// Progress messages around writing a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice<'a> {
    Creating { manifest_name: &'a str },
    Updating { manifest_name: &'a str },
    SafeModeSuppressed { manifest_path: &'a Path },
}

impl Notice<'_> {
    pub fn text(&self) -> String {
        match self {
            Notice::Creating { manifest_name } => {
                format!("  Creating checksum file {}...", manifest_name)
            }
            Notice::Updating { manifest_name } => {
                format!("  Updating checksum file {}...", manifest_name)
            }
            Notice::SafeModeSuppressed { manifest_path } => format!(
                "Safe mode prevented write to file {}",
                manifest_path.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKind {
    Create,
    Update,
}

/// A question to ask before writing a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub kind: ConfirmKind,
    /// Modification time of the existing manifest, if any.
    pub manifest_modified: Option<SystemTime>,
}

impl ConfirmRequest {
    pub fn question(&self) -> &'static str {
        match self.kind {
            ConfirmKind::Create => "  Create this checksum file? (y/n)=",
            ConfirmKind::Update => "  Update this checksum file? (y/n)=",
        }
    }
}

pub trait Console {
    fn directory(&mut self, tag: DirectoryTag, dir: &Path) -> io::Result<()>;
    fn listing(&mut self, listing: Listing<'_>) -> io::Result<()>;
    fn notice(&mut self, notice: Notice<'_>) -> io::Result<()>;
    /// Blocks until the user answers. `false` means "do not write".
    fn confirm(&mut self, request: &ConfirmRequest) -> io::Result<bool>;
}

pub struct TerminalConsole<R, W> {
    input: R,
    output: W,
    use_colors: bool,
}

impl TerminalConsole<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(use_colors: bool) -> Self {
        TerminalConsole::new(io::stdin().lock(), io::stdout(), use_colors)
    }
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(input: R, output: W, use_colors: bool) -> Self {
        TerminalConsole {
            input,
            output,
            use_colors,
        }
    }

    fn styled(&self, text: &str, paint: impl FnOnce(&str) -> ColoredString) -> String {
        if self.use_colors {
            paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn directory(&mut self, tag: DirectoryTag, dir: &Path) -> io::Result<()> {
        let line = format!("{:<8} {}", tag.label(), dir.display());
        let line = self.styled(&line, |text| match tag {
            DirectoryTag::Empty | DirectoryTag::Verify => text.bright_blue(),
            DirectoryTag::NoFile | DirectoryTag::Create => text.bright_magenta(),
        });
        writeln!(self.output, "{}", line)
    }

    fn listing(&mut self, listing: Listing<'_>) -> io::Result<()> {
        for line in listing.lines() {
            let line = self.styled(&line, |text| listing.paint(text));
            writeln!(self.output, "  {}", line)?;
        }
        Ok(())
    }

    fn notice(&mut self, notice: Notice<'_>) -> io::Result<()> {
        let text = notice.text();
        let line = match notice {
            Notice::SafeModeSuppressed { .. } => self.styled(&text, |t| t.yellow()),
            _ => text,
        };
        writeln!(self.output, "{}", line)
    }

    fn confirm(&mut self, request: &ConfirmRequest) -> io::Result<bool> {
        if request.kind == ConfirmKind::Update
            && let Some(modified) = request.manifest_modified
        {
            writeln!(self.output, "  Last Updated: {}", format_mtime(modified))?;
        }

        loop {
            write!(self.output, "{}", request.question())?;
            self.output.flush()?;

            let mut answer = String::new();
            if self.input.read_line(&mut answer)? == 0 {
                // End of input: nobody is there to agree.
                writeln!(self.output)?;
                return Ok(false);
            }

            match answer.trim_end_matches(['\r', '\n']) {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => continue,
            }
        }
    }
}

fn format_mtime(time: SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Local> = time.into();
    datetime.format("%m/%d/%Y %H:%M:%S").to_string()
}
