//! Restoring a commit's snapshot into the work tree.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::repository::Repository;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, info};

/// Result of [`Repository::checkout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReport {
    /// The commit now at HEAD.
    pub id: Hash,
    /// Files whose content was written.
    pub files_written: usize,
    /// Files that already had the right content.
    pub files_unchanged: usize,
}

/// A tracked name may only be restored if it stays inside the work tree.
fn check_restorable(name: &str) -> Result<()> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::invalid_path(
            name,
            "tracked path is outside the work tree and cannot be restored",
        ));
    }
    Ok(())
}

/// The destination must not be a directory and none of its existing parents
/// inside the work tree may be a file.
fn check_destination(work_tree: &Path, name: &str) -> Result<()> {
    if work_tree.join(name).is_dir() {
        return Err(Error::invalid_path(name, "a directory is in the way"));
    }

    let mut current = work_tree.to_path_buf();
    if let Some(parent) = Path::new(name).parent() {
        for component in parent.components() {
            current.push(component);
            if current.exists() && !current.is_dir() {
                return Err(Error::invalid_path(
                    name,
                    format!("{} is not a directory", current.display()),
                ));
            }
        }
    }
    Ok(())
}

impl Repository {
    /// Write every file of commit `id` into the work tree and move HEAD there.
    ///
    /// `id` may be abbreviated. Files not in the snapshot are left alone.
    /// Refuses to run while changes are staged, since they would be committed
    /// on top of a different parent than the one they were staged against.
    ///
    /// Every destination is checked before the first write. An I/O error
    /// during the writes themselves can still leave the work tree partly
    /// restored, with HEAD unchanged; running the checkout again finishes it.
    pub fn checkout(&self, id: &str) -> Result<CheckoutReport> {
        let staged = self.staging().load()?;
        if !staged.is_empty() {
            return Err(Error::staged_changes_present(staged.len()));
        }

        let hash = match self.store().resolve(id) {
            Ok(hash) => hash,
            Err(Error::ObjectNotFound { .. }) => return Err(Error::commit_not_found(id)),
            Err(e) => return Err(e),
        };
        let commit = self.chain().get(&hash)?;

        for name in commit.snapshot.keys() {
            check_restorable(name)?;
            check_destination(self.work_tree(), name)?;
        }

        let mut report = CheckoutReport {
            id: hash,
            files_written: 0,
            files_unchanged: 0,
        };

        for (name, blob) in &commit.snapshot {
            let dest = self.work_tree().join(name);

            if dest.is_file() && Hash::hash_file(&dest)? == *blob {
                report.files_unchanged += 1;
                continue;
            }

            let content = self.store().get_blob(blob)?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, content)?;
            debug!(path = %name, hash = %blob, "file restored");
            report.files_written += 1;
        }

        self.chain().set_head(Some(hash))?;

        info!(
            commit = %hash,
            written = report.files_written,
            unchanged = report.files_unchanged,
            "checked out"
        );
        Ok(report)
    }
}
