//! Four-way comparison of a stored manifest against fresh digests.

use crate::manifest::Manifest;
use std::collections::BTreeMap;

/// A file whose digest differs from the one recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashChange {
    pub old: String,
    pub new: String,
}

/// A recorded file that disappeared while a new file with the same digest
/// appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub old_name: String,
    pub new_name: String,
    pub hash: String,
}

/// Partition of the file names of an old and a new manifest.
///
/// Before [`ManifestDiff::detect_renames`] runs, every name of either
/// manifest is in exactly one of `matched`, `updated`, `removed` and
/// `added`. Rename detection moves pairs out of `removed` and `added` into
/// `renames`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    /// In both, same digest.
    pub matched: BTreeMap<String, String>,
    /// In both, different digest.
    pub updated: BTreeMap<String, HashChange>,
    /// Only in the old manifest, with its recorded digest.
    pub removed: BTreeMap<String, String>,
    /// Only in the new manifest, with its fresh digest.
    pub added: BTreeMap<String, String>,
    pub renames: Vec<Rename>,
}

impl ManifestDiff {
    pub fn compute(old: &Manifest, new: &Manifest) -> Self {
        let mut diff = ManifestDiff::default();

        for (name, old_hash) in &old.entries {
            match new.entries.get(name) {
                Some(new_hash) if new_hash == old_hash => {
                    diff.matched.insert(name.clone(), old_hash.clone());
                }
                Some(new_hash) => {
                    diff.updated.insert(
                        name.clone(),
                        HashChange {
                            old: old_hash.clone(),
                            new: new_hash.clone(),
                        },
                    );
                }
                None => {
                    diff.removed.insert(name.clone(), old_hash.clone());
                }
            }
        }

        for (name, new_hash) in &new.entries {
            if !old.entries.contains_key(name) {
                diff.added.insert(name.clone(), new_hash.clone());
            }
        }

        diff
    }

    /// Pairs removed and added files with identical digests as renames.
    ///
    /// Removed names are visited in order; each takes the first added name
    /// (in order) with the same digest that is still unpaired. This is a
    /// greedy first match, not an optimal matching, and costs
    /// O(removed × added).
    pub fn detect_renames(&mut self) {
        if self.removed.is_empty() || self.added.is_empty() {
            return;
        }

        let removed_names: Vec<String> = self.removed.keys().cloned().collect();

        for old_name in removed_names {
            let hash = &self.removed[&old_name];
            let Some(new_name) = self
                .added
                .iter()
                .find(|(_, added_hash)| *added_hash == hash)
                .map(|(name, _)| name.clone())
            else {
                continue;
            };

            let hash = self.removed.remove(&old_name).unwrap_or_default();
            self.added.remove(&new_name);
            self.renames.push(Rename {
                old_name,
                new_name,
                hash,
            });
        }
    }

    /// True when the manifest still describes the directory exactly.
    pub fn is_clean(&self) -> bool {
        self.updated.is_empty()
            && self.removed.is_empty()
            && self.added.is_empty()
            && self.renames.is_empty()
    }
}
