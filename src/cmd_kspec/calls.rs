use anyhow::Context;
use clap::*;
use kspec::libs::interval::{merge, GenomicInterval};
use std::io::{BufRead, Write};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("calls")
        .about("Thresholds window scores and merges positive windows")
        .after_help(
            r###"
Reads the score table written by `kspec predict`, keeps windows whose
score exceeds --threshold, and merges overlapping or adjacent survivors
into maximal intervals, reported as BED3.

Examples:
1. Default threshold 0:
   kspec calls scores.tsv -o calls.bed

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Score table from `kspec predict`"),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .short('t')
                .value_parser(value_parser!(f64))
                .default_value("0")
                .help("Keep windows with score strictly above this value"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let opt_threshold = *args.get_one::<f64>("threshold").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    let reader = kspec::reader(infile)?;

    let mut positives = vec![];
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            anyhow::bail!("{}: line {}: expected 4 score fields", infile, i + 1);
        }
        let start = fields[1]
            .parse::<usize>()
            .with_context(|| format!("{}: line {}: bad start `{}`", infile, i + 1, fields[1]))?;
        let end = fields[2]
            .parse::<usize>()
            .with_context(|| format!("{}: line {}: bad end `{}`", infile, i + 1, fields[2]))?;
        let score = fields[3]
            .parse::<f64>()
            .with_context(|| format!("{}: line {}: bad score `{}`", infile, i + 1, fields[3]))?;

        if score > opt_threshold {
            positives.push(GenomicInterval::new(fields[0], start, end));
        }
    }

    let merged = merge(&positives);
    eprintln!(
        "{} positive windows merged into {} intervals",
        positives.len(),
        merged.len()
    );

    let mut writer = kspec::writer(outfile)?;
    for iv in &merged {
        writeln!(writer, "{}", iv)?;
    }

    Ok(())
}
