mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use minigit_core::{CommitOutcome, InitOutcome, Repository};
use output::{
    AddOutput, CatOutput, CheckoutOutput, CommitOutput, GcOutput, InitOutput, LogOutput,
    OutputWriter, StatusOutput,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code for failures raised by the repository or by an empty commit.
const EXIT_FAILURE: u8 = 1;

/// Minigit - A minimal version-control engine
#[derive(Parser)]
#[command(name = "minigit")]
#[command(about = "Minimal version control over a BLAKE3 content-addressed store", long_about = None)]
#[command(version)]
struct Cli {
    /// Work tree directory (defaults to MINIGIT_ROOT env var or the current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Log debug details to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty repository
    Init,

    /// Add file(s) to the staging area
    Add {
        /// Files to stage, relative to the work tree
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Record the staged changes as a new commit
    Commit {
        /// Commit message (single line)
        #[arg(short, long)]
        message: String,
    },

    /// Show the commit history, newest first
    Log,

    /// Show HEAD and the staged changes
    Status,

    /// Restore the files of a commit and move HEAD to it
    Checkout {
        /// Commit id (full or an unambiguous prefix)
        id: String,
    },

    /// Output the raw content of an object
    Cat {
        /// Object id (full or an unambiguous prefix)
        id: String,
    },

    /// Delete objects unreachable from HEAD and the staging area
    Gc {
        /// Dry run - show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Determine work tree: CLI arg > MINIGIT_ROOT env var > current directory
    let root = cli
        .root
        .or_else(|| std::env::var("MINIGIT_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    debug!(root = %root.display(), "resolved work tree");

    let out = OutputWriter::new(cli.json);

    let result = match cli.command {
        Commands::Init => cmd_init(&root, &out),
        Commands::Add { paths } => cmd_add(&root, &paths, &out),
        Commands::Commit { message } => cmd_commit(&root, &message, &out),
        Commands::Log => cmd_log(&root, &out),
        Commands::Status => cmd_status(&root, &out),
        Commands::Checkout { id } => cmd_checkout(&root, &id, &out),
        Commands::Cat { id } => cmd_cat(&root, &id, &out),
        Commands::Gc { dry_run } => cmd_gc(&root, dry_run, &out),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            out.write_error(&e, EXIT_FAILURE);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open(root: &Path) -> Result<Repository> {
    Repository::open(root).with_context(|| format!("Failed to open repository at {}", root.display()))
}

fn cmd_init(root: &Path, out: &OutputWriter) -> Result<u8> {
    let outcome = Repository::init(root)
        .with_context(|| format!("Failed to initialize repository at {}", root.display()))?;

    let (path, created) = match &outcome {
        InitOutcome::Created(path) => (path, true),
        InitOutcome::AlreadyInitialized(path) => (path, false),
    };

    out.write(
        &InitOutput {
            success: true,
            result_code: 0,
            path: path.display().to_string(),
            created,
        },
        || {
            if created {
                format!("Initialized empty minigit repository in {}\n", path.display())
            } else {
                format!("minigit repository already initialized in {}\n", path.display())
            }
        },
    )?;

    Ok(0)
}

fn cmd_add(root: &Path, paths: &[PathBuf], out: &OutputWriter) -> Result<u8> {
    let repo = open(root)?;

    let report = repo.add(paths).with_context(|| "Failed to stage files")?;

    for skipped in &report.skipped {
        out.write_warning(&format!(
            "{}: {}. Skipping.",
            skipped.reason.as_str(),
            skipped.path
        ));
    }

    out.write(
        &AddOutput {
            success: true,
            result_code: 0,
            staged: report.staged.clone(),
            skipped: report.skipped.clone(),
        },
        || {
            report
                .staged
                .iter()
                .map(|f| format!("Staged {}\n", f.path))
                .collect()
        },
    )?;

    Ok(0)
}

fn cmd_commit(root: &Path, message: &str, out: &OutputWriter) -> Result<u8> {
    let repo = open(root)?;

    let outcome = repo
        .commit(message)
        .with_context(|| "Failed to create commit")?;

    match outcome {
        CommitOutcome::Committed(summary) => {
            out.write(
                &CommitOutput {
                    success: true,
                    result_code: 0,
                    committed: true,
                    id: Some(summary.id),
                    parent: summary.parent,
                    message: Some(summary.message.clone()),
                    files: Some(summary.files),
                },
                || format!("[{}] {}\n", summary.id.short(), summary.message),
            )?;
            Ok(0)
        }
        CommitOutcome::NothingToCommit => {
            out.write(
                &CommitOutput {
                    success: false,
                    result_code: EXIT_FAILURE,
                    committed: false,
                    id: None,
                    parent: None,
                    message: None,
                    files: None,
                },
                || "Nothing to commit, staging area is empty.\n".to_string(),
            )?;
            Ok(EXIT_FAILURE)
        }
    }
}

fn cmd_log(root: &Path, out: &OutputWriter) -> Result<u8> {
    let repo = open(root)?;

    if out.is_json() {
        let commits = repo.history().with_context(|| "Failed to read history")?;
        out.write(
            &LogOutput {
                success: true,
                result_code: 0,
                commits,
            },
            String::new,
        )?;
        return Ok(0);
    }

    // Text mode streams entries so a broken chain still shows what precedes it
    let mut any = false;
    for entry in repo.log().with_context(|| "Failed to read HEAD")? {
        let entry = entry.with_context(|| "History is broken")?;
        any = true;
        out.write_raw(format!("commit {}\n    {}\n\n", entry.id, entry.commit.message).as_bytes())?;
    }

    if !any {
        out.write_raw(b"No commits yet.\n")?;
    }

    Ok(0)
}

fn cmd_status(root: &Path, out: &OutputWriter) -> Result<u8> {
    let repo = open(root)?;

    let status = repo.status().with_context(|| "Failed to read status")?;

    out.write(
        &StatusOutput {
            success: true,
            result_code: 0,
            head: status.head,
            tracked: status.tracked,
            staged: status.staged.clone(),
        },
        || {
            let mut text = match status.head {
                Some(head) => format!("HEAD: {}\n", head),
                None => "HEAD: (no commits yet)\n".to_string(),
            };
            text.push_str(&format!("Tracked files: {}\n", status.tracked));
            if status.staged.is_empty() {
                text.push_str("Nothing staged.\n");
            } else {
                text.push_str("Staged:\n");
                for (name, hash) in &status.staged {
                    text.push_str(&format!("    {} {}\n", hash.short(), name));
                }
            }
            text
        },
    )?;

    Ok(0)
}

fn cmd_checkout(root: &Path, id: &str, out: &OutputWriter) -> Result<u8> {
    let repo = open(root)?;

    let report = repo
        .checkout(id)
        .with_context(|| format!("Failed to check out {}", id))?;

    out.write(
        &CheckoutOutput {
            success: true,
            result_code: 0,
            report: report.clone(),
        },
        || {
            format!(
                "HEAD is now at {}\n{} file(s) written, {} unchanged\n",
                report.id.short(),
                report.files_written,
                report.files_unchanged
            )
        },
    )?;

    Ok(0)
}

fn cmd_cat(root: &Path, id: &str, out: &OutputWriter) -> Result<u8> {
    let repo = open(root)?;

    let (hash, object_type, payload) = repo
        .cat(id)
        .with_context(|| format!("Failed to read object {}", id))?;

    if out.is_json() {
        out.write(
            &CatOutput {
                success: true,
                result_code: 0,
                hash,
                object_type: object_type.as_str().to_string(),
                size: payload.len(),
                content: String::from_utf8_lossy(&payload).into_owned(),
            },
            String::new,
        )?;
    } else {
        out.write_raw(&payload)?;
    }

    Ok(0)
}

fn cmd_gc(root: &Path, dry_run: bool, out: &OutputWriter) -> Result<u8> {
    let repo = open(root)?;

    let stats = repo
        .gc(dry_run)
        .with_context(|| "Failed to run garbage collection")?;

    out.write(
        &GcOutput {
            success: true,
            result_code: 0,
            dry_run,
            stats: stats.clone(),
        },
        || {
            if dry_run {
                format!(
                    "Dry run - no objects deleted\nWould delete {} objects\nWould free {} bytes\n",
                    stats.objects_deleted, stats.bytes_freed
                )
            } else {
                format!(
                    "Deleted {} objects\nFreed {} bytes\n",
                    stats.objects_deleted, stats.bytes_freed
                )
            }
        },
    )?;

    Ok(0)
}
