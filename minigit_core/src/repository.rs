//! Repository layout and the `init` / `add` / `commit` / `log` workflows.

use crate::chain::{CommitChain, LogEntry, Walk};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::ObjectType;
use crate::staging::{Snapshot, StagingArea, validate_filename};
use crate::store::ObjectStore;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the repository directory inside the work tree.
pub const REPO_DIR: &str = ".minigit";

/// Outcome of [`Repository::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// A new repository was created at this path.
    Created(PathBuf),
    /// A repository already existed and was left untouched.
    AlreadyInitialized(PathBuf),
}

/// Why `add` passed over a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing exists at the path.
    NotFound,
    /// The path is a directory.
    IsDirectory,
    /// The path lies inside the repository directory itself.
    RepositoryInternal,
    /// The path resolves outside the work tree.
    OutsideWorkTree,
}

impl SkipReason {
    /// Human-readable description.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotFound => "file not found",
            SkipReason::IsDirectory => "cannot add directories",
            SkipReason::RepositoryInternal => "path is inside the repository directory",
            SkipReason::OutsideWorkTree => "path is outside the work tree",
        }
    }
}

/// A file recorded in the staging area by `add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFile {
    /// Name the file is tracked under.
    pub path: String,
    /// Blob id of its content.
    pub hash: Hash,
    /// False when the blob was already in the object store.
    pub new_object: bool,
}

/// A path `add` did not stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPath {
    /// The path as given.
    pub path: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Result of [`Repository::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddReport {
    /// Files staged, in argument order.
    pub staged: Vec<StagedFile>,
    /// Paths skipped, in argument order.
    pub skipped: Vec<SkippedPath>,
}

/// Summary of a newly created commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    /// Id of the new commit (the new HEAD).
    pub id: Hash,
    /// Previous HEAD.
    pub parent: Option<Hash>,
    /// Commit message.
    pub message: String,
    /// Number of files in the new snapshot.
    pub files: usize,
    /// Number of staged entries applied on top of the parent snapshot.
    pub staged: usize,
}

/// Result of [`Repository::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was created and HEAD advanced.
    Committed(CommitSummary),
    /// The staging area was empty; nothing changed.
    NothingToCommit,
}

/// Read-only view of HEAD and the staging area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Current HEAD.
    pub head: Option<Hash>,
    /// Files tracked by HEAD's snapshot.
    pub tracked: usize,
    /// Entries waiting for the next commit.
    pub staged: Snapshot,
}

/// A minigit repository rooted at a work tree.
#[derive(Debug, Clone)]
pub struct Repository {
    work_tree: PathBuf,
    repo_dir: PathBuf,
    config: Config,
    store: ObjectStore,
    staging: StagingArea,
    chain: CommitChain,
}

impl Repository {
    /// Whether a repository exists in `work_tree`.
    pub fn exists<P: AsRef<Path>>(work_tree: P) -> bool {
        work_tree.as_ref().join(REPO_DIR).is_dir()
    }

    /// Create the repository layout in `work_tree` unless one already exists.
    ///
    /// Creates:
    /// - `.minigit/objects/` for blobs and commits
    /// - `.minigit/config` with version and algorithm
    /// - `.minigit/HEAD`, empty
    /// - `.minigit/index`, empty
    pub fn init<P: AsRef<Path>>(work_tree: P) -> Result<InitOutcome> {
        let work_tree = work_tree.as_ref();
        let repo_dir = work_tree.join(REPO_DIR);

        if Self::exists(work_tree) {
            info!(path = %repo_dir.display(), "repository already initialized");
            return Ok(InitOutcome::AlreadyInitialized(repo_dir));
        }

        fs::create_dir_all(repo_dir.join("objects"))?;
        Config::default().write(&repo_dir.join("config"))?;
        fs::write(repo_dir.join("HEAD"), "")?;
        fs::write(repo_dir.join("index"), "")?;

        let repo_dir = fs::canonicalize(&repo_dir)?;
        info!(path = %repo_dir.display(), "repository initialized");
        Ok(InitOutcome::Created(repo_dir))
    }

    /// Open the repository in `work_tree`.
    pub fn open<P: AsRef<Path>>(work_tree: P) -> Result<Self> {
        let work_tree = work_tree.as_ref();
        if !Self::exists(work_tree) {
            return Err(Error::repository_not_initialized(work_tree));
        }

        let work_tree = fs::canonicalize(work_tree)?;
        let repo_dir = work_tree.join(REPO_DIR);
        let config = Config::load(&repo_dir.join("config"))?;

        let objects_dir = repo_dir.join("objects");
        if !objects_dir.is_dir() {
            return Err(Error::invalid_config(
                &repo_dir,
                "objects directory missing",
            ));
        }

        let store = ObjectStore::new(&objects_dir, config.algorithm);
        let staging = StagingArea::new(repo_dir.join("index"));
        let chain = CommitChain::new(repo_dir.join("HEAD"), store.clone());

        debug!(path = %repo_dir.display(), "repository opened");
        Ok(Self {
            work_tree,
            repo_dir,
            config,
            store,
            staging,
            chain,
        })
    }

    /// The work tree directory.
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// The `.minigit` directory.
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Repository settings.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The object store.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// The staging area.
    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// The commit chain and HEAD.
    pub fn chain(&self) -> &CommitChain {
        &self.chain
    }

    /// Stage each file in `paths`.
    ///
    /// Relative paths are taken relative to the work tree. Missing paths,
    /// directories and files outside the work tree are skipped and reported,
    /// not treated as errors. Each file is written to the index as soon as
    /// it is stored, so a failure part-way keeps everything staged before it.
    pub fn add<P: AsRef<Path>>(&self, paths: &[P]) -> Result<AddReport> {
        let mut report = AddReport::default();

        for path in paths {
            let path = path.as_ref();
            let full = if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.work_tree.join(path)
            };

            let located = if !full.exists() {
                Err(SkipReason::NotFound)
            } else if full.is_dir() {
                Err(SkipReason::IsDirectory)
            } else {
                self.locate(&full)?
            };

            let name = match located {
                Ok(name) => name,
                Err(reason) => {
                    warn!(path = %path.display(), reason = reason.as_str(), "skipping path");
                    report.skipped.push(SkippedPath {
                        path: path.display().to_string(),
                        reason,
                    });
                    continue;
                }
            };

            let content = fs::read(&full)?;
            let stored = self.store.put_blob(&content)?;
            self.staging.stage(&name, stored.hash)?;

            debug!(path = %name, hash = %stored.hash, new = stored.written, "file staged");
            report.staged.push(StagedFile {
                path: name,
                hash: stored.hash,
                new_object: stored.written,
            });
        }

        info!(
            staged = report.staged.len(),
            skipped = report.skipped.len(),
            "add finished"
        );
        Ok(report)
    }

    /// Record the staging area as a new commit on top of HEAD.
    pub fn commit(&self, message: &str) -> Result<CommitOutcome> {
        let staged = self.staging.load()?;
        if staged.is_empty() {
            info!("nothing to commit");
            return Ok(CommitOutcome::NothingToCommit);
        }

        let parent = self.chain.head()?;
        let mut snapshot = self.chain.snapshot_of(parent.as_ref())?;
        let staged_count = staged.len();
        snapshot.extend(staged);
        let files = snapshot.len();

        let id = self.chain.append(parent, message, snapshot)?;
        self.chain.set_head(Some(id))?;
        self.staging.clear()?;

        info!(commit = %id, files, staged = staged_count, "committed");
        Ok(CommitOutcome::Committed(CommitSummary {
            id,
            parent,
            message: message.to_string(),
            files,
            staged: staged_count,
        }))
    }

    /// Walk history from HEAD, newest first.
    pub fn log(&self) -> Result<Walk<'_>> {
        Ok(self.chain.walk(self.chain.head()?))
    }

    /// The whole history from HEAD, newest first.
    pub fn history(&self) -> Result<Vec<LogEntry>> {
        self.log()?.collect()
    }

    /// Current HEAD and staged entries.
    pub fn status(&self) -> Result<Status> {
        let head = self.chain.head()?;
        let tracked = self.chain.snapshot_of(head.as_ref())?.len();
        let staged = self.staging.load()?;
        Ok(Status {
            head,
            tracked,
            staged,
        })
    }

    /// Raw payload of any object, by full or abbreviated id.
    pub fn cat(&self, id: &str) -> Result<(Hash, ObjectType, Vec<u8>)> {
        let hash = self.store.resolve(id)?;
        let (object_type, payload) = self.store.get(&hash)?;
        Ok((hash, object_type, payload))
    }

    /// Name an existing file is tracked under, or why it cannot be tracked.
    ///
    /// Only the parent directory is resolved, so a symlink keeps its own
    /// name. The result is relative to the work tree with `/` separators.
    fn locate(&self, full: &Path) -> Result<std::result::Result<String, SkipReason>> {
        let resolved = match (full.parent(), full.file_name()) {
            (Some(parent), Some(file_name)) => fs::canonicalize(parent)?.join(file_name),
            _ => fs::canonicalize(full)?,
        };

        if resolved.starts_with(&self.repo_dir) {
            return Ok(Err(SkipReason::RepositoryInternal));
        }
        let Ok(relative) = resolved.strip_prefix(&self.work_tree) else {
            return Ok(Err(SkipReason::OutsideWorkTree));
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                    Error::invalid_path(full.display().to_string(), "path is not valid UTF-8")
                })?),
                _ => return Ok(Err(SkipReason::OutsideWorkTree)),
            }
        }

        let name = parts.join("/");
        validate_filename(&name)?;
        Ok(Ok(name))
    }
}
