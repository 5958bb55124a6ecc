//! Commit records and their text encoding.
//!
//! Format (line-oriented, UTF-8):
//!
//! ```text
//! parent: <hex id or empty>
//! message: <single line>
//! file: <filename> <hex id>
//! ...
//! ```
//!
//! `file` lines are sorted by filename, so equal snapshots always encode to
//! the same bytes and therefore the same commit id.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::staging::{Snapshot, parse_entry, validate_filename};
use serde::Serialize;
use std::path::Path;

const PARENT_PREFIX: &str = "parent: ";
const MESSAGE_PREFIX: &str = "message: ";
const FILE_PREFIX: &str = "file: ";

/// An immutable commit: parent link, message and full snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    /// Previous commit, `None` for the root.
    pub parent: Option<Hash>,
    /// Caller-supplied message (single line).
    pub message: String,
    /// Every tracked file as of this commit.
    pub snapshot: Snapshot,
}

/// Check that a message fits on the `message:` line.
pub fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(Error::invalid_message("message cannot be empty"));
    }
    if message.contains('\n') || message.contains('\r') {
        return Err(Error::invalid_message("message must be a single line"));
    }
    Ok(())
}

impl Commit {
    /// Build a commit after validating the message and filenames.
    pub fn new(parent: Option<Hash>, message: impl Into<String>, snapshot: Snapshot) -> Result<Self> {
        let message = message.into();
        validate_message(&message)?;
        for name in snapshot.keys() {
            validate_filename(name)?;
        }

        Ok(Self {
            parent,
            message,
            snapshot,
        })
    }

    /// Whether this is the first commit of the history.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Serialize to the canonical text form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = String::new();

        out.push_str(PARENT_PREFIX);
        if let Some(parent) = &self.parent {
            out.push_str(&parent.to_hex());
        }
        out.push('\n');

        out.push_str(MESSAGE_PREFIX);
        out.push_str(&self.message);
        out.push('\n');

        // BTreeMap iteration is already sorted by filename
        for (name, hash) in &self.snapshot {
            out.push_str(FILE_PREFIX);
            out.push_str(name);
            out.push(' ');
            out.push_str(&hash.to_hex());
            out.push('\n');
        }

        out.into_bytes()
    }

    /// Parse the text form.
    ///
    /// Unknown lines are ignored. When `parent` or `message` repeat, the
    /// first occurrence wins. `path` is only used to label errors.
    pub fn decode(bytes: &[u8], path: &Path) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::corrupted_object(path, format!("commit is not UTF-8: {}", e)))?;

        let mut parent: Option<Option<Hash>> = None;
        let mut message: Option<String> = None;
        let mut snapshot = Snapshot::new();

        for line in text.lines() {
            if let Some(value) = line
                .strip_prefix(PARENT_PREFIX)
                .or_else(|| (line == PARENT_PREFIX.trim_end()).then_some(""))
            {
                if parent.is_some() {
                    continue;
                }
                let value = value.trim();
                parent = Some(if value.is_empty() {
                    None
                } else {
                    Some(Hash::from_hex(value).map_err(|e| {
                        Error::corrupted_object(path, format!("bad parent id: {}", e))
                    })?)
                });
            } else if let Some(value) = line
                .strip_prefix(MESSAGE_PREFIX)
                .or_else(|| (line == MESSAGE_PREFIX.trim_end()).then_some(""))
            {
                if message.is_none() {
                    message = Some(value.to_string());
                }
            } else if let Some(entry) = line.strip_prefix(FILE_PREFIX) {
                let (name, hash) = parse_entry(entry).ok_or_else(|| {
                    Error::corrupted_object(path, format!("bad file line: {:?}", line))
                })?;
                snapshot.insert(name.to_string(), hash);
            }
        }

        let parent =
            parent.ok_or_else(|| Error::corrupted_object(path, "commit has no parent line"))?;
        let message =
            message.ok_or_else(|| Error::corrupted_object(path, "commit has no message line"))?;

        Ok(Self {
            parent,
            message,
            snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> &'static Path {
        Path::new("objects/commit")
    }

    fn snapshot(entries: &[(&str, &[u8])]) -> Snapshot {
        entries
            .iter()
            .map(|(name, content)| (name.to_string(), Hash::hash_bytes(content)))
            .collect()
    }

    #[test]
    fn test_encode_root_commit() {
        let files = snapshot(&[("file1.txt", b"Hello World")]);
        let commit = Commit::new(None, "Initial commit", files.clone()).unwrap();

        let text = String::from_utf8(commit.encode()).unwrap();
        assert_eq!(
            text,
            format!(
                "parent: \nmessage: Initial commit\nfile: file1.txt {}\n",
                files["file1.txt"]
            )
        );
        assert!(commit.is_root());
    }

    #[test]
    fn test_encode_sorts_files() {
        let files = snapshot(&[("zeta", b"z"), ("alpha", b"a"), ("mid dle", b"m")]);
        let commit = Commit::new(None, "sorted", files).unwrap();

        let text = String::from_utf8(commit.encode()).unwrap();
        let names: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("file: "))
            .map(|l| l.rsplit_once(' ').unwrap().0)
            .collect();
        assert_eq!(names, vec!["alpha", "mid dle", "zeta"]);
    }

    #[test]
    fn test_identical_commits_encode_identically() {
        let parent = Some(Hash::hash_bytes(b"parent"));
        let a = Commit::new(parent, "msg", snapshot(&[("a", b"1"), ("b", b"2")])).unwrap();
        let b = Commit::new(parent, "msg", snapshot(&[("b", b"2"), ("a", b"1")])).unwrap();
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn test_decode_roundtrip_with_parent() {
        let parent = Hash::hash_bytes(b"parent");
        let commit =
            Commit::new(Some(parent), "Add file2 and modify file1", snapshot(&[("f", b"x")]))
                .unwrap();

        let decoded = Commit::decode(&commit.encode(), p()).unwrap();
        assert_eq!(decoded, commit);
        assert_eq!(decoded.parent, Some(parent));
    }

    #[test]
    fn test_decode_ignores_unknown_lines() {
        let text = "parent: \nauthor: someone\nmessage: hi\nfile: a.txt ".to_string()
            + &Hash::hash_bytes(b"a").to_hex()
            + "\nextra stuff\n";

        let commit = Commit::decode(text.as_bytes(), p()).unwrap();
        assert_eq!(commit.message, "hi");
        assert_eq!(commit.snapshot.len(), 1);
    }

    #[test]
    fn test_decode_first_occurrence_wins() {
        let first = Hash::hash_bytes(b"first");
        let second = Hash::hash_bytes(b"second");
        let text = format!(
            "parent: {}\nmessage: one\nparent: {}\nmessage: two\n",
            first, second
        );

        let commit = Commit::decode(text.as_bytes(), p()).unwrap();
        assert_eq!(commit.parent, Some(first));
        assert_eq!(commit.message, "one");
    }

    #[test]
    fn test_decode_tolerates_trimmed_empty_parent() {
        let commit = Commit::decode(b"parent:\nmessage: m\n", p()).unwrap();
        assert_eq!(commit.parent, None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Commit::decode(b"message: no parent\n", p()).is_err());
        assert!(Commit::decode(b"parent: \n", p()).is_err());
        assert!(Commit::decode(b"parent: nothex\nmessage: m\n", p()).is_err());
        assert!(Commit::decode(b"parent: \nmessage: m\nfile: broken\n", p()).is_err());
        assert!(Commit::decode(&[0xff, 0xfe], p()).is_err());
    }

    #[test]
    fn test_message_validation() {
        assert!(Commit::new(None, "", Snapshot::new()).is_err());
        assert!(Commit::new(None, "   ", Snapshot::new()).is_err());
        assert!(matches!(
            Commit::new(None, "two\nlines", Snapshot::new()),
            Err(Error::InvalidMessage { .. })
        ));
    }

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Decoding an encoded commit yields the same commit.
        #[test]
        fn prop_decode_inverts_encode(
            parent in prop::option::of(prop::array::uniform32(any::<u8>())),
            message in "[^\r\n]{0,40}".prop_filter("non-blank", |m| !m.trim().is_empty()),
            entries in prop::collection::btree_map(
                "[a-z0-9_./ -]{1,20}".prop_filter("non-blank", |s| !s.trim().is_empty()),
                prop::array::uniform32(any::<u8>()),
                0..8,
            ),
        ) {
            let snapshot: Snapshot = entries
                .into_iter()
                .map(|(k, v)| (k, Hash::from_bytes(v)))
                .collect();
            let commit = Commit::new(parent.map(Hash::from_bytes), message, snapshot)?;
            prop_assert_eq!(Commit::decode(&commit.encode(), p())?, commit);
        }
    }
}
