//! The staging area: pending filename → blob id entries awaiting the next commit.
//!
//! Persisted as the `index` file, one `<filename> <hex id>` line per entry,
//! sorted by filename. Lines are split on the last space, so filenames may
//! contain spaces but never line breaks.

use crate::error::{Error, Result};
use crate::hash::Hash;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filename → content id, ordered by filename.
pub type Snapshot = BTreeMap<String, Hash>;

/// Check that a filename can be written to the index and commit formats.
pub fn validate_filename(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_path(name, "filename cannot be empty"));
    }
    if name.contains('\n') || name.contains('\r') {
        return Err(Error::invalid_path(name, "filename cannot contain line breaks"));
    }
    if name.contains('\0') {
        return Err(Error::invalid_path(name, "filename cannot contain null bytes"));
    }
    Ok(())
}

/// Split `<filename> <hex id>` on its last space.
pub(crate) fn parse_entry(line: &str) -> Option<(&str, Hash)> {
    let (name, hex) = line.rsplit_once(' ')?;
    if name.is_empty() {
        return None;
    }
    let hash = Hash::from_hex(hex).ok()?;
    Some((name, hash))
}

/// Handle on the persisted staging area of one repository.
#[derive(Debug, Clone)]
pub struct StagingArea {
    path: PathBuf,
}

impl StagingArea {
    /// Create a handle for the index file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every staged entry. A missing index is an empty staging area.
    pub fn load(&self) -> Result<Snapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Snapshot::new()),
            Err(e) => return Err(e.into()),
        };

        let mut staged = Snapshot::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let (name, hash) = parse_entry(line).ok_or_else(|| {
                Error::corrupted_index(
                    &self.path,
                    format!("malformed entry on line {}: {:?}", lineno + 1, line),
                )
            })?;
            staged.insert(name.to_string(), hash);
        }

        Ok(staged)
    }

    /// Replace the persisted staging area with `staged`.
    pub fn save(&self, staged: &Snapshot) -> Result<()> {
        let mut content = String::new();
        for (name, hash) in staged {
            validate_filename(name)?;
            content.push_str(name);
            content.push(' ');
            content.push_str(&hash.to_hex());
            content.push('\n');
        }

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.path)?;

        debug!(entries = staged.len(), "index written");
        Ok(())
    }

    /// Record one file, replacing any earlier entry under the same name.
    pub fn stage(&self, name: &str, hash: Hash) -> Result<()> {
        validate_filename(name)?;
        let mut staged = self.load()?;
        staged.insert(name.to_string(), hash);
        self.save(&staged)
    }

    /// Empty the staging area.
    pub fn clear(&self) -> Result<()> {
        self.save(&Snapshot::new())
    }
}
