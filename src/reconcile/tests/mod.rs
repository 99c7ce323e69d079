use super::*;
use crate::checksum::{DigestBatch, Md5Hasher};
use crate::policy::Preset;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const HASH_A: &str = "0cc175b9c0f1b6a831c399e269772661";
const HASH_B: &str = "92eb5ffee6ae2fec3ad71c777531578f";

/// Everything the reconciler told the user, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Directory(DirectoryTag),
    /// The listing header, e.g. `NEW FILES (2)`.
    Listing(String),
    Notice(String),
    Confirm(ConfirmKind),
}

/// Records output and replays canned answers to confirmation prompts.
#[derive(Default)]
struct ScriptedConsole {
    answers: VecDeque<bool>,
    events: Vec<Event>,
    /// How long each answer takes.
    delay: Duration,
    /// Read at every prompt, the way the interrupt handler would.
    shared: Option<SharedStats>,
    seen_at_prompt: Vec<RunStats>,
}

impl ScriptedConsole {
    fn answering(answers: &[bool]) -> Self {
        ScriptedConsole {
            answers: answers.iter().copied().collect(),
            ..ScriptedConsole::default()
        }
    }

    fn listings(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Listing(header) => Some(header.as_str()),
                _ => None,
            })
            .collect()
    }

    fn prompts(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Confirm(_)))
            .count()
    }

    fn directories(&self) -> Vec<DirectoryTag> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Directory(tag) => Some(*tag),
                _ => None,
            })
            .collect()
    }

    fn notices(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Notice(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Console for ScriptedConsole {
    fn directory(&mut self, tag: DirectoryTag, _dir: &Path) -> io::Result<()> {
        self.events.push(Event::Directory(tag));
        Ok(())
    }

    fn listing(&mut self, listing: Listing<'_>) -> io::Result<()> {
        self.events.push(Event::Listing(listing.lines()[0].clone()));
        Ok(())
    }

    fn notice(&mut self, notice: Notice<'_>) -> io::Result<()> {
        self.events.push(Event::Notice(notice.text()));
        Ok(())
    }

    fn confirm(&mut self, request: &ConfirmRequest) -> io::Result<bool> {
        self.events.push(Event::Confirm(request.kind));
        thread::sleep(self.delay);
        if let Some(shared) = &self.shared {
            self.seen_at_prompt.push(shared.snapshot());
        }
        Ok(self
            .answers
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected {:?} prompt", request.kind)))
    }
}

/// Fails every hashing request, proving a directory was never hashed.
struct FailingHasher;

impl HashProvider for FailingHasher {
    fn compute_digests(&self, _dir: &Path, _names: &[String]) -> Result<DigestBatch, ChecksumError> {
        Err(ChecksumError::Io(io::Error::other("hashing not expected")))
    }
}

/// A directory named `docs` inside a fresh temporary directory.
fn docs_dir(temp: &TempDir) -> PathBuf {
    let dir = temp.path().join("docs");
    fs::create_dir(&dir).unwrap();
    dir
}

fn write_manifest(dir: &Path, entries: &[(&str, &str)]) {
    let raw: String = entries
        .iter()
        .map(|(name, hash)| format!("{}  {}\n", hash, name))
        .collect();
    fs::write(dir.join("docs.md5"), raw).unwrap();
}

fn read_manifest(dir: &Path) -> Manifest {
    Manifest::parse(&fs::read(dir.join("docs.md5")).unwrap())
}

fn process(
    dir: &Path,
    policy: &Policy,
    options: RunOptions,
    console: &mut ScriptedConsole,
) -> Result<DirectoryOutcome, ReconcileError> {
    let mut stats = RunStats::new();
    Reconciler::new(policy, options, &Md5Hasher, console).process_directory(dir, &mut stats)
}

fn with_missing(missing: MissingAction) -> Policy {
    Policy {
        missing,
        ..Policy::default()
    }
}
