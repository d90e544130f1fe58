use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn train_toy(dir: &Path) -> anyhow::Result<()> {
    let genome = format!(">chr1\n{}{}\n", "A".repeat(40), "T".repeat(40));
    fs::write(dir.join("genome.fa"), genome)?;
    fs::write(dir.join("fg.bed"), "chr1\t0\t40\n")?;
    fs::write(dir.join("bg.bed"), "chr1\t40\t80\n")?;

    let mut cmd = Command::cargo_bin("kspec")?;
    cmd.arg("train")
        .arg(dir.join("genome.fa"))
        .arg(dir.join("fg.bed"))
        .arg(dir.join("bg.bed"))
        .arg("-k")
        .arg("1")
        .arg("-w")
        .arg("20")
        .arg("-c")
        .arg("10")
        .arg("-o")
        .arg(dir.join("model.json"));
    cmd.assert().success();

    Ok(())
}

fn scores_of(stdout: &str) -> Vec<(String, f64)> {
    stdout
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            (
                format!("{}:{}-{}", fields[0], fields[1], fields[2]),
                fields[3].parse::<f64>().unwrap(),
            )
        })
        .collect()
}

#[test]
fn command_predict() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    train_toy(temp.path())?;

    let mut cmd = Command::cargo_bin("kspec")?;
    let output = cmd
        .arg("predict")
        .arg(temp.path().join("model.json"))
        .arg(temp.path().join("genome.fa"))
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let scores = scores_of(&stdout);

    // whole chromosome tiled with the model's window size
    assert_eq!(scores.len(), 4);
    assert_eq!(scores[0].0, "chr1:0-20");

    // training windows recovered with the correct sign
    assert!(scores[0].1 > 0.0);
    assert!(scores[1].1 > 0.0);
    assert!(scores[2].1 < 0.0);
    assert!(scores[3].1 < 0.0);

    Ok(())
}

#[test]
fn command_predict_regions() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    train_toy(temp.path())?;
    fs::write(temp.path().join("regions.bed"), "chr1\t40\t80\n")?;

    let mut cmd = Command::cargo_bin("kspec")?;
    let output = cmd
        .arg("predict")
        .arg(temp.path().join("model.json"))
        .arg(temp.path().join("genome.fa"))
        .arg("--regions")
        .arg(temp.path().join("regions.bed"))
        .output()?;

    assert!(output.status.success());
    let scores = scores_of(&String::from_utf8(output.stdout)?);
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().all(|(_, s)| *s < 0.0));

    Ok(())
}

#[test]
fn command_predict_idempotent() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    train_toy(temp.path())?;

    let run = || -> anyhow::Result<String> {
        let mut cmd = Command::cargo_bin("kspec")?;
        let output = cmd
            .arg("predict")
            .arg(temp.path().join("model.json"))
            .arg(temp.path().join("genome.fa"))
            .output()?;
        Ok(String::from_utf8(output.stdout)?)
    };

    assert_eq!(run()?, run()?);

    Ok(())
}

#[test]
fn command_predict_to_calls() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    train_toy(temp.path())?;
    let scores_file = temp.path().join("scores.tsv");

    let mut cmd = Command::cargo_bin("kspec")?;
    cmd.arg("predict")
        .arg(temp.path().join("model.json"))
        .arg(temp.path().join("genome.fa"))
        .arg("-o")
        .arg(&scores_file);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("kspec")?;
    let output = cmd.arg("calls").arg(&scores_file).output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    // the two positive A windows merge into one interval
    assert_eq!(stdout, "chr1\t0\t40\n");

    Ok(())
}

#[test]
fn command_predict_malformed_model() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    train_toy(temp.path())?;
    let model = temp.path().join("broken.json");
    fs::write(&model, "{ not json")?;

    let mut cmd = Command::cargo_bin("kspec")?;
    cmd.arg("predict")
        .arg(&model)
        .arg(temp.path().join("genome.fa"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("broken.json"));

    Ok(())
}
