use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn command_window_exact() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("regions.bed");
    fs::write(&input, "chr1\t0\t2250\n")?;

    let mut cmd = Command::cargo_bin("kspec")?;
    let output = cmd.arg("window").arg(&input).output()?;

    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout, "chr1\t0\t750\nchr1\t750\t1500\nchr1\t1500\t2250\n");

    Ok(())
}

#[test]
fn command_window_trims_trailing() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("regions.bed");
    fs::write(&input, "chr1\t0\t2300\n")?;

    let mut cmd = Command::cargo_bin("kspec")?;
    let output = cmd.arg("window").arg(&input).output()?;

    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout.lines().count(), 3);
    assert!(stdout.ends_with("chr1\t1500\t2250\n"));

    Ok(())
}

#[test]
fn command_window_too_narrow() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("regions.bed");
    fs::write(&input, "chr1\t0\t500\n")?;

    let mut cmd = Command::cargo_bin("kspec")?;
    let output = cmd.arg("window").arg(&input).output()?;

    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    Ok(())
}

#[test]
fn command_window_custom_size() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("regions.bed");
    let output_file = temp.path().join("windows.bed");
    fs::write(&input, "chr1\t100\t1000\nchr2\t0\t200\n")?;

    let mut cmd = Command::cargo_bin("kspec")?;
    cmd.arg("window")
        .arg(&input)
        .arg("--size")
        .arg("200")
        .arg("-o")
        .arg(&output_file);
    cmd.assert().success();

    let content = fs::read_to_string(&output_file)?;
    assert_eq!(content.lines().count(), 5);
    assert!(content.contains("chr1\t100\t300\n"));
    assert!(content.contains("chr2\t0\t200\n"));

    Ok(())
}

#[test]
fn command_window_zero_size() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("regions.bed");
    fs::write(&input, "chr1\t0\t2250\n")?;

    let mut cmd = Command::cargo_bin("kspec")?;
    cmd.arg("window").arg(&input).arg("--size").arg("0");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("window size"));

    Ok(())
}

#[test]
fn command_window_missing_file() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("kspec")?;
    cmd.arg("window").arg("does/not/exist.bed");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("exist.bed"));

    Ok(())
}
