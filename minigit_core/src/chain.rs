//! The commit chain: HEAD plus the singly-linked list of commits behind it.

use crate::commit::Commit;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::ObjectType;
use crate::staging::Snapshot;
use crate::store::ObjectStore;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One step of a history walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Id of the commit.
    pub id: Hash,
    /// The decoded commit.
    #[serde(flatten)]
    pub commit: Commit,
}

/// HEAD register and commit persistence for one repository.
#[derive(Debug, Clone)]
pub struct CommitChain {
    head_path: PathBuf,
    store: ObjectStore,
}

impl CommitChain {
    /// Create a chain over `store` whose HEAD lives at `head_path`.
    pub fn new<P: AsRef<Path>>(head_path: P, store: ObjectStore) -> Self {
        Self {
            head_path: head_path.as_ref().to_path_buf(),
            store,
        }
    }

    /// Path of the HEAD file.
    pub fn head_path(&self) -> &Path {
        &self.head_path
    }

    /// The most recent commit, or `None` before the first commit.
    pub fn head(&self) -> Result<Option<Hash>> {
        let content = match fs::read_to_string(&self.head_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = content.trim();
        if value.is_empty() {
            return Ok(None);
        }

        Hash::from_hex(value)
            .map(Some)
            .map_err(|e| Error::corrupted_head(&self.head_path, e.to_string()))
    }

    /// Point HEAD at `id`, or clear it with `None`.
    ///
    /// This is the only place HEAD is written.
    pub fn set_head(&self, id: Option<Hash>) -> Result<()> {
        let content = match id {
            Some(hash) => format!("{}\n", hash.to_hex()),
            None => String::new(),
        };

        let dir = self.head_path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.head_path)?;

        debug!(head = ?id, "HEAD updated");
        Ok(())
    }

    /// Load and decode the commit stored under `id`.
    pub fn get(&self, id: &Hash) -> Result<Commit> {
        let payload = match self.store.get_typed(id, ObjectType::Commit) {
            Ok(payload) => payload,
            Err(Error::ObjectNotFound { .. }) => return Err(Error::commit_not_found(id.to_hex())),
            Err(e) => return Err(e),
        };
        Commit::decode(&payload, &self.store.object_path(id))
    }

    /// The full snapshot recorded by `id`; empty for `None` (no commits yet).
    pub fn snapshot_of(&self, id: Option<&Hash>) -> Result<Snapshot> {
        match id {
            Some(id) => Ok(self.get(id)?.snapshot),
            None => Ok(Snapshot::new()),
        }
    }

    /// Persist a new commit and return its id. HEAD is left untouched.
    ///
    /// Appending a record identical to an existing commit is a no-op that
    /// returns the existing id.
    pub fn append(
        &self,
        parent: Option<Hash>,
        message: &str,
        snapshot: Snapshot,
    ) -> Result<Hash> {
        let commit = Commit::new(parent, message, snapshot)?;
        let stored = self.store.put(ObjectType::Commit, &commit.encode())?;

        info!(
            commit = %stored.hash,
            parent = ?parent,
            files = commit.snapshot.len(),
            new = stored.written,
            "commit stored"
        );
        Ok(stored.hash)
    }

    /// Walk history from `start` back to the root, newest first.
    pub fn walk(&self, start: Option<Hash>) -> Walk<'_> {
        Walk {
            chain: self,
            next: start,
        }
    }
}

/// Lazy iterator over commits following parent links.
///
/// Yields an error and then stops if a commit in the chain is missing or
/// unreadable.
pub struct Walk<'a> {
    chain: &'a CommitChain,
    next: Option<Hash>,
}

impl Iterator for Walk<'_> {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;

        match self.chain.get(&id) {
            Ok(commit) => {
                self.next = commit.parent;
                Some(Ok(LogEntry { id, commit }))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl std::iter::FusedIterator for Walk<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Algorithm;
    use tempfile::TempDir;

    fn chain() -> (TempDir, CommitChain) {
        let temp_dir = TempDir::new().unwrap();
        let objects = temp_dir.path().join("objects");
        fs::create_dir(&objects).unwrap();
        let store = ObjectStore::new(&objects, Algorithm::Blake3);
        let chain = CommitChain::new(temp_dir.path().join("HEAD"), store);
        (temp_dir, chain)
    }

    fn files(entries: &[(&str, &[u8])]) -> Snapshot {
        entries
            .iter()
            .map(|(n, c)| (n.to_string(), Hash::hash_bytes(c)))
            .collect()
    }

    #[test]
    fn test_head_missing_or_empty() {
        let (_temp_dir, chain) = chain();
        assert_eq!(chain.head().unwrap(), None);

        fs::write(chain.head_path(), "").unwrap();
        assert_eq!(chain.head().unwrap(), None);

        fs::write(chain.head_path(), "  \n").unwrap();
        assert_eq!(chain.head().unwrap(), None);
    }

    #[test]
    fn test_set_head_and_read_back() {
        let (_temp_dir, chain) = chain();
        let id = Hash::hash_bytes(b"commit");

        chain.set_head(Some(id)).unwrap();
        assert_eq!(chain.head().unwrap(), Some(id));

        chain.set_head(None).unwrap();
        assert_eq!(chain.head().unwrap(), None);
    }

    #[test]
    fn test_corrupted_head() {
        let (_temp_dir, chain) = chain();
        fs::write(chain.head_path(), "garbage").unwrap();
        assert!(matches!(chain.head(), Err(Error::CorruptedHead { .. })));
    }

    #[test]
    fn test_append_does_not_move_head() {
        let (_temp_dir, chain) = chain();
        let id = chain.append(None, "first", files(&[("a", b"1")])).unwrap();

        assert_eq!(chain.head().unwrap(), None);
        assert_eq!(chain.get(&id).unwrap().message, "first");
    }

    #[test]
    fn test_append_is_idempotent() {
        let (_temp_dir, chain) = chain();
        let a = chain.append(None, "same", files(&[("a", b"1")])).unwrap();
        let b = chain.append(None, "same", files(&[("a", b"1")])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_of() {
        let (_temp_dir, chain) = chain();
        assert!(chain.snapshot_of(None).unwrap().is_empty());

        let snapshot = files(&[("a", b"1"), ("b", b"2")]);
        let id = chain.append(None, "m", snapshot.clone()).unwrap();
        assert_eq!(chain.snapshot_of(Some(&id)).unwrap(), snapshot);

        let missing = Hash::hash_bytes(b"nope");
        assert!(matches!(
            chain.snapshot_of(Some(&missing)),
            Err(Error::CommitNotFound { .. })
        ));
    }

    #[test]
    fn test_get_blob_as_commit_fails() {
        let (_temp_dir, chain) = chain();
        let blob = chain.store.put_blob(b"just bytes").unwrap().hash;
        assert!(matches!(
            chain.get(&blob),
            Err(Error::InvalidObjectType { .. })
        ));
    }

    #[test]
    fn test_walk_newest_first() {
        let (_temp_dir, chain) = chain();
        let c1 = chain.append(None, "one", files(&[("a", b"1")])).unwrap();
        let c2 = chain.append(Some(c1), "two", files(&[("a", b"2")])).unwrap();
        let c3 = chain.append(Some(c2), "three", files(&[("a", b"3")])).unwrap();

        let entries: Vec<LogEntry> = chain.walk(Some(c3)).collect::<Result<_>>().unwrap();
        let ids: Vec<Hash> = entries.iter().map(|e| e.id).collect();
        let messages: Vec<&str> = entries.iter().map(|e| e.commit.message.as_str()).collect();

        assert_eq!(ids, vec![c3, c2, c1]);
        assert_eq!(messages, vec!["three", "two", "one"]);
        assert_eq!(entries[0].commit.parent, Some(c2));
        assert!(entries[2].commit.is_root());
    }

    #[test]
    fn test_walk_from_nothing_is_empty() {
        let (_temp_dir, chain) = chain();
        assert_eq!(chain.walk(None).count(), 0);
    }

    #[test]
    fn test_walk_reports_broken_chain() {
        let (_temp_dir, chain) = chain();
        let ghost = Hash::hash_bytes(b"never stored");
        let tip = chain.append(Some(ghost), "orphan", files(&[])).unwrap();

        let mut walk = chain.walk(Some(tip));
        assert!(walk.next().unwrap().is_ok());
        assert!(matches!(
            walk.next(),
            Some(Err(Error::CommitNotFound { .. }))
        ));
        assert!(walk.next().is_none());
    }
}
