use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::path::Path;

fn minigit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("minigit").expect("binary builds");
    cmd.current_dir(dir)
        .env_remove("MINIGIT_ROOT")
        .env_remove("RUST_LOG");
    cmd
}

fn init_repo() -> Result<TempDir, Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    minigit(dir.path()).arg("init").assert().success();
    Ok(dir)
}

fn head(dir: &TempDir) -> String {
    std::fs::read_to_string(dir.path().join(".minigit/HEAD"))
        .expect("HEAD readable")
        .trim()
        .to_string()
}

#[test]
fn init_creates_layout_and_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;

    minigit(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Initialized empty minigit repository in",
        ));

    dir.child(".minigit/objects").assert(predicate::path::is_dir());
    dir.child(".minigit/HEAD").assert("");
    dir.child(".minigit/index").assert("");
    dir.child(".minigit/config")
        .assert(predicate::str::contains("algo=blake3-256"));

    minigit(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));

    Ok(())
}

#[test]
fn commands_fail_outside_a_repository() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    dir.child("a.txt").write_str("a")?;

    for args in [vec!["add", "a.txt"], vec!["commit", "-m", "x"], vec!["log"]] {
        minigit(dir.path())
            .args(&args)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Not a minigit repository"));
    }

    Ok(())
}

#[test]
fn usage_errors_exit_with_code_two() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;

    minigit(dir.path()).arg("add").assert().code(2);
    minigit(dir.path()).arg("commit").assert().code(2);
    minigit(dir.path()).arg("frobnicate").assert().code(2);

    Ok(())
}

#[test]
fn first_commit_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;
    dir.child("file1.txt").write_str("Hello World")?;

    minigit(dir.path())
        .args(["add", "file1.txt"])
        .assert()
        .success()
        .stdout("Staged file1.txt\n");

    minigit(dir.path())
        .args(["commit", "-m", "Initial commit"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\[[0-9a-f]{12}\] Initial commit\n$")?);

    let id = head(&dir);
    assert_eq!(id.len(), 64);
    dir.child(".minigit/index").assert("");

    minigit(dir.path())
        .arg("log")
        .assert()
        .success()
        .stdout(format!("commit {}\n    Initial commit\n\n", id));

    Ok(())
}

#[test]
fn second_commit_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;
    dir.child("file1.txt").write_str("Hello World")?;
    minigit(dir.path()).args(["add", "file1.txt"]).assert().success();
    minigit(dir.path())
        .args(["commit", "-m", "Initial commit"])
        .assert()
        .success();
    let first = head(&dir);

    dir.child("file1.txt").write_str("Hello World, modified")?;
    dir.child("file2.txt").write_str("A second file")?;
    minigit(dir.path())
        .args(["add", "file1.txt", "file2.txt"])
        .assert()
        .success();
    minigit(dir.path())
        .args(["commit", "-m", "Add file2 and modify file1"])
        .assert()
        .success();
    let second = head(&dir);
    assert_ne!(first, second);

    minigit(dir.path())
        .arg("log")
        .assert()
        .success()
        .stdout(format!(
            "commit {}\n    Add file2 and modify file1\n\ncommit {}\n    Initial commit\n\n",
            second, first
        ));

    let commit = minigit(dir.path()).args(["cat", &second]).output()?;
    let text = String::from_utf8(commit.stdout)?;
    assert!(text.starts_with(&format!("parent: {}\nmessage: Add file2 and modify file1\n", first)));
    assert!(text.contains("file: file1.txt "));
    assert!(text.contains("file: file2.txt "));

    Ok(())
}

#[test]
fn commit_with_nothing_staged() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;

    minigit(dir.path())
        .args(["commit", "-m", "empty"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Nothing to commit"));

    dir.child(".minigit/HEAD").assert("");
    assert_eq!(std::fs::read_dir(dir.path().join(".minigit/objects"))?.count(), 0);

    Ok(())
}

#[test]
fn log_on_fresh_repository() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;

    minigit(dir.path())
        .arg("log")
        .assert()
        .success()
        .stdout("No commits yet.\n");

    Ok(())
}

#[test]
fn add_skips_missing_files_and_directories() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;
    dir.child("real.txt").write_str("real")?;
    dir.child("folder").create_dir_all()?;

    minigit(dir.path())
        .args(["add", "ghost.txt", "folder", "real.txt"])
        .assert()
        .success()
        .stdout("Staged real.txt\n")
        .stderr(predicate::str::contains("file not found: ghost.txt. Skipping."))
        .stderr(predicate::str::contains("cannot add directories: folder. Skipping."));

    let index = std::fs::read_to_string(dir.path().join(".minigit/index"))?;
    assert_eq!(index.lines().count(), 1);
    assert!(index.starts_with("real.txt "));

    Ok(())
}

#[test]
fn add_skips_files_outside_work_tree() -> Result<(), Box<dyn std::error::Error>> {
    let outer = TempDir::new()?;
    outer.child("outside.txt").write_str("outside")?;
    let work = outer.child("work");
    work.create_dir_all()?;
    minigit(work.path()).arg("init").assert().success();

    minigit(work.path())
        .args(["add", "../outside.txt"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains(
            "path is outside the work tree: ../outside.txt. Skipping.",
        ));

    work.child(".minigit/index").assert("");

    Ok(())
}

#[test]
fn identical_files_share_one_object() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;
    dir.child("a.txt").write_str("twin")?;
    dir.child("b.txt").write_str("twin")?;

    minigit(dir.path()).args(["add", "a.txt", "b.txt"]).assert().success();
    minigit(dir.path()).args(["add", "a.txt"]).assert().success();

    assert_eq!(std::fs::read_dir(dir.path().join(".minigit/objects"))?.count(), 1);

    Ok(())
}

#[test]
fn multi_line_message_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;
    dir.child("a.txt").write_str("a")?;
    minigit(dir.path()).args(["add", "a.txt"]).assert().success();

    minigit(dir.path())
        .args(["commit", "-m", "first line\nsecond line"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("single line"));

    dir.child(".minigit/HEAD").assert("");

    Ok(())
}

#[test]
fn checkout_restores_earlier_commit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;
    dir.child("a.txt").write_str("version one")?;
    minigit(dir.path()).args(["add", "a.txt"]).assert().success();
    minigit(dir.path()).args(["commit", "-m", "one"]).assert().success();
    let first = head(&dir);

    dir.child("a.txt").write_str("version two")?;
    minigit(dir.path()).args(["add", "a.txt"]).assert().success();
    minigit(dir.path()).args(["commit", "-m", "two"]).assert().success();

    minigit(dir.path())
        .args(["checkout", &first[..10]])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("HEAD is now at {}", &first[..12])));

    dir.child("a.txt").assert("version one");
    assert_eq!(head(&dir), first);

    minigit(dir.path())
        .arg("log")
        .assert()
        .success()
        .stdout(format!("commit {}\n    one\n\n", first));

    minigit(dir.path())
        .args(["gc", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would delete 2 objects"));

    Ok(())
}

#[test]
fn root_flag_selects_work_tree() -> Result<(), Box<dyn std::error::Error>> {
    let elsewhere = TempDir::new()?;
    let project = TempDir::new()?;
    project.child("notes.txt").write_str("notes")?;

    minigit(elsewhere.path())
        .args(["--root", project.path().to_str().unwrap(), "init"])
        .assert()
        .success();
    minigit(elsewhere.path())
        .args(["add", "notes.txt"])
        .env("MINIGIT_ROOT", project.path())
        .assert()
        .success()
        .stdout("Staged notes.txt\n");

    project.child(".minigit/index")
        .assert(predicate::str::starts_with("notes.txt "));
    elsewhere.child(".minigit").assert(predicate::path::missing());

    Ok(())
}

#[test]
fn json_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repo()?;
    dir.child("file1.txt").write_str("Hello World")?;
    minigit(dir.path()).args(["add", "file1.txt"]).assert().success();
    minigit(dir.path())
        .args(["commit", "-m", "Initial commit"])
        .assert()
        .success();

    let output = minigit(dir.path()).args(["--json", "log"]).output()?;
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    assert_eq!(json["success"], true);
    assert_eq!(json["result_code"], 0);
    let commits = json["commits"].as_array().unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0]["id"], head(&dir));
    assert_eq!(commits[0]["message"], "Initial commit");
    assert!(commits[0]["parent"].is_null());
    assert!(commits[0]["snapshot"]["file1.txt"].is_string());

    Ok(())
}
