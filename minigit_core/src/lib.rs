//! # Minigit Core
//!
//! A minimal version-control engine over a content-addressed store using
//! BLAKE3 hashing.
//!
//! File contents are stored as blobs keyed by their hash, a staging area
//! records which blob each tracked filename should have in the next commit,
//! and commits form a single linked list from HEAD back to the root. Each
//! commit carries the full filename → blob snapshot, so any commit can be
//! restored on its own.
//!
//! ## Features
//!
//! - Content-addressed storage: identical content is stored once
//! - Typed object headers and read-time hash verification
//! - Linear history with snapshot inheritance
//! - Checkout of any commit and garbage collection of orphaned objects
//!
//! ## Example
//!
//! ```no_run
//! use minigit_core::{CommitOutcome, Repository};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! Repository::init("./project")?;
//! let repo = Repository::open("./project")?;
//!
//! // Stage a file and commit it
//! repo.add(&["notes.txt"])?;
//! if let CommitOutcome::Committed(summary) = repo.commit("Initial commit")? {
//!     println!("committed {}", summary.id);
//! }
//!
//! // Walk history from HEAD
//! for entry in repo.log()? {
//!     let entry = entry?;
//!     println!("{} {}", entry.id.short(), entry.commit.message);
//! }
//! # Ok(())
//! # }
//! ```

mod chain;
mod checkout;
mod commit;
mod config;
mod error;
mod gc;
mod hash;
mod object;
mod repository;
mod staging;
mod store;

pub use chain::{CommitChain, LogEntry, Walk};
pub use checkout::CheckoutReport;
pub use commit::Commit;
pub use config::Config;
pub use error::{Error, Result};
pub use gc::GcStats;
pub use hash::{Algorithm, Hash};
pub use object::{ObjectHeader, ObjectType};
pub use repository::{
    AddReport, CommitOutcome, CommitSummary, InitOutcome, REPO_DIR, Repository, SkipReason,
    SkippedPath, StagedFile, Status,
};
pub use staging::{Snapshot, StagingArea};
pub use store::{ObjectStore, Stored};
