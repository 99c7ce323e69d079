use crate::checksum::{ChecksumError, HashProvider};
use crate::diff::ManifestDiff;
use crate::dir_list::{DirListError, list_content_files, manifest_file_name, walk_directories};
use crate::manifest::{self, Manifest, ManifestError, manifest_path};
use crate::policy::{Action, MissingAction, Policy};
use crate::report::{ConfirmKind, ConfirmRequest, Console, DirectoryTag, Listing, Notice};
use crate::stats::{RunStats, SharedStats};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Missing checksum file in {0}")]
    MissingManifest(PathBuf),
    #[error("Updated files were found in {0}. The hashes don't match.")]
    UpdatedHashes(PathBuf),
    #[error(
        "Renamed files were found in {0}. The file names aren't consistent with the checksum file."
    )]
    RenameDetected(PathBuf),
    #[error("New files were found in {0}. The files aren't in the checksum file.")]
    NewFiles(PathBuf),
    #[error("Some files were deleted from {0}")]
    DeletedFiles(PathBuf),
    #[error("Directory listing error: {0}")]
    DirList(#[from] DirListError),
    #[error("Checksum error: {0}")]
    Checksum(#[from] ChecksumError),
    #[error("Checksum file error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Never write manifests; report what would have been written.
    pub safe_mode: bool,
}

/// How processing of one directory ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryOutcome {
    /// No content files; nothing was hashed.
    Empty,
    /// No manifest and the policy said not to create one.
    Skipped,
    /// The manifest was left as it was.
    Unchanged,
    /// A manifest was created. `written` is false in safe mode.
    Created { written: bool },
    /// An existing manifest was rewritten. `written` is false in safe mode.
    Updated { written: bool },
}

/// What the policy asks for after looking at a directory's differences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionFlags {
    pub should_update: bool,
    pub should_prompt: bool,
}

impl ActionFlags {
    fn apply(&mut self, action: Action) {
        match action {
            Action::Autoupdate => self.should_update = true,
            Action::Prompt => {
                self.should_update = true;
                self.should_prompt = true;
            }
            Action::Ignore | Action::Show | Action::Fail => {}
        }
    }
}

/// Reports each non-empty category of `diff` and folds the policy into
/// [`ActionFlags`].
///
/// Categories are handled in the order updates, renames, additions,
/// removals. A `fail` policy aborts right after its category was listed,
/// so the listings of earlier categories are still shown. When the
/// manifest is absent, additions bypass the `new` policy: they are not
/// listed and ask for confirmation unless `missing` is `create`.
pub fn evaluate_actions<C: Console>(
    diff: &ManifestDiff,
    policy: &Policy,
    manifest_absent: bool,
    dir: &Path,
    console: &mut C,
) -> Result<ActionFlags, ReconcileError> {
    let mut flags = ActionFlags::default();

    if !diff.updated.is_empty() {
        report_category(
            policy.updates,
            Listing::Updated(&diff.updated),
            &mut flags,
            console,
        )?;
        if policy.updates == Action::Fail {
            return Err(ReconcileError::UpdatedHashes(dir.to_path_buf()));
        }
    }

    if !diff.renames.is_empty() {
        report_category(
            policy.renames,
            Listing::Renamed(&diff.renames),
            &mut flags,
            console,
        )?;
        if policy.renames == Action::Fail {
            return Err(ReconcileError::RenameDetected(dir.to_path_buf()));
        }
    }

    if !diff.added.is_empty() {
        if manifest_absent {
            if policy.missing != MissingAction::Create {
                flags.should_prompt = true;
            }
        } else {
            report_category(
                policy.new,
                Listing::Added(&diff.added),
                &mut flags,
                console,
            )?;
            if policy.new == Action::Fail {
                return Err(ReconcileError::NewFiles(dir.to_path_buf()));
            }
        }
    }

    if !diff.removed.is_empty() {
        report_category(
            policy.deletes,
            Listing::Removed(&diff.removed),
            &mut flags,
            console,
        )?;
        if policy.deletes == Action::Fail {
            return Err(ReconcileError::DeletedFiles(dir.to_path_buf()));
        }
    }

    Ok(flags)
}

fn report_category<C: Console>(
    action: Action,
    listing: Listing<'_>,
    flags: &mut ActionFlags,
    console: &mut C,
) -> Result<(), ReconcileError> {
    if action != Action::Ignore {
        console.listing(listing)?;
    }
    flags.apply(action);
    Ok(())
}

/// Verifies and maintains the manifests of directory trees, one directory
/// at a time.
pub struct Reconciler<'a, H, C> {
    policy: &'a Policy,
    options: RunOptions,
    hasher: &'a H,
    console: &'a mut C,
    shared: Option<SharedStats>,
}

impl<'a, H: HashProvider, C: Console> Reconciler<'a, H, C> {
    pub fn new(policy: &'a Policy, options: RunOptions, hasher: &'a H, console: &'a mut C) -> Self {
        Reconciler {
            policy,
            options,
            hasher,
            console,
            shared: None,
        }
    }

    /// Keeps `shared` up to date as directories are hashed and prompts are
    /// answered.
    pub fn with_shared_stats(mut self, shared: SharedStats) -> Self {
        self.shared = Some(shared);
        self
    }

    fn publish(&self, stats: &RunStats) {
        if let Some(shared) = &self.shared {
            shared.publish(stats);
        }
    }

    /// Processes every directory below each root, in order.
    ///
    /// The first error aborts the run; directories already processed keep
    /// whatever was written for them. The clock in `stats` is stopped once
    /// the last directory is done.
    pub fn run(&mut self, roots: &[PathBuf], stats: &mut RunStats) -> Result<(), ReconcileError> {
        for root in roots {
            info!("Scanning {}", root.display());
            for dir in walk_directories(root) {
                let dir = dir?;
                let outcome = self.process_directory(&dir, stats)?;
                debug!("{}: {:?}", dir.display(), outcome);
            }
        }
        stats.finish();
        self.publish(stats);
        Ok(())
    }

    /// Loads, hashes, compares, reports and possibly rewrites the manifest
    /// of a single directory.
    pub fn process_directory(
        &mut self,
        dir: &Path,
        stats: &mut RunStats,
    ) -> Result<DirectoryOutcome, ReconcileError> {
        let shown = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

        let files = list_content_files(dir)?;
        if files.is_empty() {
            self.console.directory(DirectoryTag::Empty, &shown)?;
            return Ok(DirectoryOutcome::Empty);
        }

        let loaded = Manifest::load(dir)?;
        match (&loaded, self.policy.missing) {
            (Some(_), _) => self.console.directory(DirectoryTag::Verify, &shown)?,
            (None, MissingAction::Skip | MissingAction::Show) => {
                self.console.directory(DirectoryTag::NoFile, &shown)?;
                return Ok(DirectoryOutcome::Skipped);
            }
            (None, MissingAction::Fail) => {
                self.console.directory(DirectoryTag::NoFile, &shown)?;
                return Err(ReconcileError::MissingManifest(shown));
            }
            (None, MissingAction::Prompt) => {
                self.console.directory(DirectoryTag::NoFile, &shown)?
            }
            (None, MissingAction::Create | MissingAction::Ignore) => {
                self.console.directory(DirectoryTag::Create, &shown)?
            }
        }
        let manifest_absent = loaded.is_none();

        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        let batch = self.hasher.compute_digests(dir, &names)?;
        stats.record_directory(files.len() as u64, files.iter().map(|f| f.size).sum());
        self.publish(stats);

        let empty = Manifest::default();
        let old = loaded.as_ref().map_or(&empty, |l| &l.manifest);
        let mut diff = ManifestDiff::compute(old, &batch.digests);
        diff.detect_renames();
        if diff.is_clean() {
            debug!("{}: all {} files match", dir.display(), diff.matched.len());
        } else {
            debug!(
                "{}: {} matched, {} updated, {} renamed, {} added, {} removed",
                dir.display(),
                diff.matched.len(),
                diff.updated.len(),
                diff.renames.len(),
                diff.added.len(),
                diff.removed.len()
            );
        }

        let flags = evaluate_actions(&diff, self.policy, manifest_absent, &shown, self.console)?;

        let mut confirmed = true;
        if flags.should_prompt {
            let request = ConfirmRequest {
                kind: if manifest_absent {
                    ConfirmKind::Create
                } else {
                    ConfirmKind::Update
                },
                manifest_modified: loaded.as_ref().and_then(|l| l.modified),
            };
            let waiting_since = Instant::now();
            if let Some(shared) = &self.shared {
                shared.begin_wait(waiting_since);
            }
            confirmed = self.console.confirm(&request)?;
            stats.wait += waiting_since.elapsed();
            self.publish(stats);
        }

        if !(flags.should_update || manifest_absent) || !confirmed {
            return Ok(DirectoryOutcome::Unchanged);
        }

        let manifest_name = manifest_file_name(dir);
        if !manifest_absent {
            self.console.notice(Notice::Updating {
                manifest_name: &manifest_name,
            })?;
        } else if self.policy.missing == MissingAction::Prompt {
            self.console.notice(Notice::Creating {
                manifest_name: &manifest_name,
            })?;
        }

        let path = loaded
            .as_ref()
            .map_or_else(|| manifest_path(dir), |l| l.path.clone());
        let written = if self.options.safe_mode {
            self.console.notice(Notice::SafeModeSuppressed {
                manifest_path: &path,
            })?;
            false
        } else {
            manifest::save(&path, &batch.raw)?;
            info!("Wrote {}", path.display());
            true
        };

        Ok(if manifest_absent {
            DirectoryOutcome::Created { written }
        } else {
            DirectoryOutcome::Updated { written }
        })
    }
}

#[cfg(test)]
mod tests;
