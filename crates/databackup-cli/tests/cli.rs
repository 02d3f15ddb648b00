//! Process-level behaviour of the `databackup` binary.

use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn databackup() -> Result<Command, Box<dyn Error>> {
    let mut command = Command::cargo_bin("databackup")?;
    command
        .env_clear()
        .env("DATABACKUP_LOG_FORMAT", "pretty")
        .env("DATABACKUP_LOG_LEVEL", "info");
    Ok(command)
}

#[test]
fn no_arguments_prints_usage_and_exits_two() -> Result<(), Box<dyn Error>> {
    databackup()?
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Usage: databackup <source-directory> <destination> [--s3 | --glacier | --both]",
        ))
        .stderr(predicate::str::contains("--both: Backup to both S3 and Glacier (default)"));
    Ok(())
}

#[test]
fn usage_exit_code_is_configurable() -> Result<(), Box<dyn Error>> {
    databackup()?
        .env("DATABACKUP_USAGE_EXIT_CODE", "0")
        .arg("/only-one-argument")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Usage: databackup"));
    Ok(())
}

#[test]
fn conflicting_modes_are_a_usage_error() -> Result<(), Box<dyn Error>> {
    databackup()?
        .args(["/data", "bucket", "--s3", "--glacier"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
    Ok(())
}

#[test]
fn help_lists_modes_and_exits_zero() -> Result<(), Box<dyn Error>> {
    databackup()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--glacier"))
        .stdout(predicate::str::contains("--keep-on-failure"));
    Ok(())
}

#[test]
fn missing_source_is_logged_without_uploading() -> Result<(), Box<dyn Error>> {
    let scratch = TempDir::new()?;
    let staging = scratch.path().join("staging");
    databackup()?
        .env("DATABACKUP_TEMP_DIR", &staging)
        .arg(scratch.path().join("does-not-exist"))
        .arg("my-bucket")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Source directory not found"))
        .stdout(predicate::str::contains("Step 1").not());
    assert!(!staging.exists());
    Ok(())
}

#[test]
fn invalid_settings_file_is_a_usage_error() -> Result<(), Box<dyn Error>> {
    let scratch = TempDir::new()?;
    let config = scratch.path().join("settings.json");
    fs::write(&config, r#"{ "upload_strategy": "whenever" }"#)?;
    databackup()?
        .arg("--config")
        .arg(&config)
        .args(["/data", "bucket"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load settings"));
    Ok(())
}

#[test]
fn unreachable_storage_fails_with_exit_one_and_cleans_up() -> Result<(), Box<dyn Error>> {
    let scratch = TempDir::new()?;
    let source = scratch.path().join("source");
    let staging = scratch.path().join("staging");
    fs::create_dir_all(&source)?;
    fs::write(source.join("notes.txt"), "hello")?;

    databackup()?
        .env("DATABACKUP_TEMP_DIR", &staging)
        .env("AWS_ACCESS_KEY_ID", "test")
        .env("AWS_SECRET_ACCESS_KEY", "test")
        .env("AWS_REGION", "us-east-1")
        .env("AWS_ENDPOINT_URL", "http://127.0.0.1:9")
        .env("AWS_MAX_ATTEMPTS", "1")
        .env("AWS_EC2_METADATA_DISABLED", "true")
        .arg(&source)
        .arg("my-bucket")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Zip archive created successfully"))
        .stdout(predicate::str::contains("Backup operation failed"))
        .stdout(predicate::str::contains("Temporary zip file deleted"));

    assert_eq!(fs::read_dir(&staging)?.count(), 0);
    Ok(())
}
