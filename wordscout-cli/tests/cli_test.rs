use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<PathBuf> {
    let list_path = dir.path().join("files.txt");
    let mut list = File::create(&list_path)?;
    for (name, content) in files {
        fs::write(dir.path().join(name), content)?;
        writeln!(list, "{}", name)?;
    }
    Ok(list_path)
}

fn wordscout(dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("wordscout-cli")?;
    cmd.current_dir(dir.path());
    Ok(cmd)
}

#[test]
fn test_basic_and_file_searches() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("file1", "hello hello"), ("file2", "hello world")])?;

    // The missing-file query only returns once indexing has finished, so the
    // basic search after it sees every file.
    wordscout(&dir)?
        .args(["2", "files.txt"])
        .write_stdin("file2 world\nfile3 hello\nhello\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "FOUND: file2 1\nERROR: File <file3> not found\n",
        ))
        .stdout(predicate::str::contains("FOUND: file1 1").count(2))
        .stdout(predicate::str::contains("FOUND: file2 1").count(2));
    Ok(())
}

#[test]
fn test_bad_input_and_missing_word() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("file1", "alpha beta")])?;

    wordscout(&dir)?
        .args(["1", "files.txt"])
        .write_stdin("file1 gamma\n\na b c\n")
        .assert()
        .success()
        .stdout("Word not found\nERROR: Bad input\n");
    Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("file1", "alpha beta")])?;

    wordscout(&dir)?
        .args(["1", "files.txt", "--json"])
        .write_stdin("file1 beta\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""query":"file1 beta""#))
        .stdout(predicate::str::contains(r#""status":"found""#))
        .stdout(predicate::str::contains(
            r#"{"filename":"file1","line_number":1}"#,
        ));
    Ok(())
}

#[test]
fn test_zero_threads_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("file1", "alpha")])?;

    wordscout(&dir)?
        .args(["0", "files.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains(
            "Number of indexer threads must be > 0",
        ));
    Ok(())
}

#[test]
fn test_missing_file_list_is_rejected() -> Result<()> {
    let dir = tempdir()?;

    wordscout(&dir)?
        .args(["2", "no-such-list.txt"])
        .write_stdin("hello\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot open file list"));
    Ok(())
}

#[test]
fn test_root_directory_walk() -> Result<()> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("docs"))?;
    fs::write(dir.path().join("docs/a.txt"), "needle")?;
    fs::write(dir.path().join("docs/b.md"), "needle")?;

    wordscout(&dir)?
        .args(["2", "--root", "docs", "-e", "txt"])
        .write_stdin("docs/missing.txt needle\nneedle\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt 1"))
        .stdout(predicate::str::contains("b.md").not());
    Ok(())
}

#[test]
fn test_print_config() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("file1", "alpha")])?;

    wordscout(&dir)?
        .args(["3", "files.txt", "--buffer-size", "7", "--print-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("thread_count: 3"))
        .stdout(predicate::str::contains("buffer_capacity: 7"));
    Ok(())
}

#[test]
fn test_local_config_file_is_read() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("file1", "alpha")])?;
    fs::write(dir.path().join(".wordscout.yaml"), "buffer_capacity: 5\n")?;

    wordscout(&dir)?
        .args(["2", "files.txt", "--print-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("buffer_capacity: 5"))
        .stdout(predicate::str::contains("thread_count: 2"));
    Ok(())
}

#[test]
fn test_undecodable_query_line_is_not_fatal() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("file1", "hello")])?;

    wordscout(&dir)?
        .args(["1", "files.txt"])
        .write_stdin(b"file1 caf\xe9\nfile1 hello\n".to_vec())
        .assert()
        .success()
        .stdout("Word not found\nFOUND: file1 1\n");
    Ok(())
}

#[test]
fn test_encoding_modes() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("good", "alpha")])?;
    fs::write(dir.path().join("bad"), b"alpha caf\xe9\n")?;
    let mut list = fs::OpenOptions::new()
        .append(true)
        .open(dir.path().join("files.txt"))?;
    writeln!(list, "bad")?;

    wordscout(&dir)?
        .args(["2", "files.txt", "--encoding", "failfast"])
        .write_stdin("bad alpha\ngood alpha\n")
        .assert()
        .success()
        .stdout("ERROR: File <bad> not found\nFOUND: good 1\n");

    wordscout(&dir)?
        .args(["2", "files.txt", "--encoding", "lossy"])
        .write_stdin("bad alpha\n")
        .assert()
        .success()
        .stdout("FOUND: bad 1\n");
    Ok(())
}

#[test]
fn test_unknown_encoding_is_a_usage_error() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("file1", "alpha")])?;

    wordscout(&dir)?
        .args(["1", "files.txt", "--encoding", "latin1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("latin1"));
    Ok(())
}

#[test]
fn test_wait_timeout_accepts_durations() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("file1", "alpha")])?;

    // A bound larger than any representable deadline waits without one.
    wordscout(&dir)?
        .args(["2", "files.txt", "--wait-timeout", "300000000000y"])
        .write_stdin("file1 alpha\nmissing alpha\n")
        .assert()
        .success()
        .stdout("FOUND: file1 1\nERROR: File <missing> not found\n");

    wordscout(&dir)?
        .args(["2", "files.txt", "--wait-timeout", "30s"])
        .write_stdin("file1 alpha\n")
        .assert()
        .success()
        .stdout("FOUND: file1 1\n");

    wordscout(&dir)?
        .args(["2", "files.txt", "--wait-timeout", "soon"])
        .assert()
        .failure();
    Ok(())
}
