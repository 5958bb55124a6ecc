//! Garbage collection of objects no longer reachable from HEAD or the index.

use crate::error::Result;
use crate::hash::Hash;
use crate::repository::Repository;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use tracing::info;

/// Statistics from a garbage collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GcStats {
    /// Number of objects deleted (or that would be, on a dry run).
    pub objects_deleted: usize,
    /// Bytes freed.
    pub bytes_freed: u64,
}

impl Repository {
    /// Run garbage collection.
    ///
    /// Marks every commit reachable from HEAD, every blob in their snapshots
    /// and every staged blob, then deletes all other objects. These are the
    /// commits left behind by an interrupted `commit` or a `checkout` to an
    /// older commit. If `dry_run` is true, reports what would be deleted
    /// without actually deleting.
    ///
    /// A broken chain aborts the run before anything is deleted.
    pub fn gc(&self, dry_run: bool) -> Result<GcStats> {
        let reachable = self.mark_reachable()?;
        self.sweep(&reachable, dry_run)
    }

    /// Mark phase: collect every object still referenced.
    fn mark_reachable(&self) -> Result<HashSet<Hash>> {
        let mut reachable = HashSet::new();

        for entry in self.log()? {
            let entry = entry?;
            reachable.insert(entry.id);
            reachable.extend(entry.commit.snapshot.values().copied());
        }

        reachable.extend(self.staging().load()?.values().copied());

        Ok(reachable)
    }

    /// Sweep phase: delete unreachable objects.
    fn sweep(&self, reachable: &HashSet<Hash>, dry_run: bool) -> Result<GcStats> {
        let mut stats = GcStats {
            objects_deleted: 0,
            bytes_freed: 0,
        };

        for hash in self.store().list()? {
            if reachable.contains(&hash) {
                continue;
            }

            if dry_run {
                stats.bytes_freed += fs::metadata(self.store().object_path(&hash))?.len();
            } else {
                stats.bytes_freed += self.store().remove(&hash)?;
            }
            stats.objects_deleted += 1;
        }

        info!(
            dry_run,
            objects = stats.objects_deleted,
            bytes = stats.bytes_freed,
            "garbage collection finished"
        );
        Ok(stats)
    }
}
