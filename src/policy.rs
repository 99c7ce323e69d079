//! Per-category reconciliation policy.
//!
//! A [`Policy`] decides, for each kind of difference between a stored
//! manifest and the files on disk, whether the difference is ignored,
//! shown, written back automatically, written back after confirmation, or
//! treated as a fatal error. It is resolved once at startup from the
//! explicit category flags and any preset flags, and never changes during
//! a run.

use clap::ValueEnum;
use serde::Serialize;

/// What to do about one category of differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Neither report nor record the difference.
    Ignore,
    /// Report the difference but leave the manifest alone.
    Show,
    /// Report the difference and rewrite the manifest without asking.
    Autoupdate,
    /// Report the difference and ask before rewriting the manifest.
    Prompt,
    /// Report the difference and abort the whole run.
    Fail,
}

/// What to do about a directory that has no manifest yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingAction {
    /// Hash the directory and write a manifest, asking first if there are
    /// files to record.
    Ignore,
    /// Report and move on without hashing.
    Skip,
    /// Report and move on without hashing.
    Show,
    /// Hash the directory and write a manifest without asking.
    Create,
    /// Hash the directory and ask before writing a manifest.
    Prompt,
    /// Abort the whole run.
    Fail,
}

/// Bundles that override every category at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    AutoupdateAll,
    VerifyAll,
    RefreshAll,
    UpdateAll,
    PromptAll,
}

impl Preset {
    /// Order in which presets are applied when several are requested. The
    /// last one applied wins.
    pub const APPLY_ORDER: [Preset; 5] = [
        Preset::AutoupdateAll,
        Preset::VerifyAll,
        Preset::RefreshAll,
        Preset::UpdateAll,
        Preset::PromptAll,
    ];

    pub fn policy(self) -> Policy {
        use Action::{Autoupdate, Prompt, Show};

        match self {
            Preset::AutoupdateAll => Policy {
                renames: Autoupdate,
                missing: MissingAction::Create,
                new: Autoupdate,
                deletes: Autoupdate,
                updates: Autoupdate,
            },
            Preset::VerifyAll => Policy {
                renames: Show,
                missing: MissingAction::Show,
                new: Show,
                deletes: Show,
                updates: Show,
            },
            Preset::RefreshAll => Policy {
                renames: Autoupdate,
                missing: MissingAction::Create,
                new: Autoupdate,
                deletes: Prompt,
                updates: Prompt,
            },
            Preset::UpdateAll => Policy {
                renames: Prompt,
                missing: MissingAction::Create,
                new: Prompt,
                deletes: Prompt,
                updates: Prompt,
            },
            Preset::PromptAll => Policy {
                renames: Prompt,
                missing: MissingAction::Prompt,
                new: Prompt,
                deletes: Prompt,
                updates: Prompt,
            },
        }
    }
}

/// The resolved policy for a run. Field order is the order in which the
/// policy is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub renames: Action,
    pub missing: MissingAction,
    pub new: Action,
    pub deletes: Action,
    pub updates: Action,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            renames: Action::Show,
            missing: MissingAction::Ignore,
            new: Action::Prompt,
            deletes: Action::Prompt,
            updates: Action::Prompt,
        }
    }
}

impl Policy {
    /// Applies the requested presets on top of the explicit policy.
    ///
    /// Presets are applied in [`Preset::APPLY_ORDER`] regardless of the
    /// order in `presets`, and each one replaces all five categories.
    pub fn resolve(explicit: Policy, presets: &[Preset]) -> Policy {
        Preset::APPLY_ORDER
            .iter()
            .filter(|preset| presets.contains(preset))
            .fold(explicit, |_, preset| preset.policy())
    }

    /// Renders the policy as a TOML key/value listing.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}
