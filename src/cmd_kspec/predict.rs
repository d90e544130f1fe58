use clap::*;
use kspec::libs::fasta::SeqStore;
use kspec::libs::interval::{read_bed, window};
use kspec::libs::svm::{predict_spectrum_svm, Model, Prediction};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("predict")
        .about("Scores genomic windows with a fitted model")
        .after_help(
            r###"
Sequences are tiled into windows of the model's window size and scored
against the stored support vectors. Output is a TSV table of
name / start / end / score, one row per window, in input order. A score
above 0 reads as foreground-like.

Notes:
* Without --regions, every sequence of the FASTA is tiled whole.
* The model file is read-only; repeated runs produce identical scores.

Examples:
1. Score a genome:
   kspec predict model.json genome.fa -o scores.tsv

2. Restrict to regions, 8 threads:
   kspec predict model.json genome.fa --regions regions.bed -p 8

"###,
        )
        .arg(
            Arg::new("model")
                .required(true)
                .index(1)
                .help("Model file written by `kspec train`"),
        )
        .arg(
            Arg::new("genome")
                .required(true)
                .index(2)
                .help("FASTA file with sequences to score"),
        )
        .arg(
            Arg::new("regions")
                .long("regions")
                .num_args(1)
                .help("BED file restricting prediction to these intervals"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .value_parser(value_parser!(usize))
                .default_value("1")
                .help("Number of threads for parallel processing"),
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
    //----------------------------
    // Args
    //----------------------------
    let model_file = args.get_one::<String>("model").unwrap();
    let genome_file = args.get_one::<String>("genome").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    // Set the number of threads for rayon
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;

    //----------------------------
    // Load
    //----------------------------
    let model = Model::load(model_file)?;
    let genome = SeqStore::load(genome_file)?;

    let intervals = match args.get_one::<String>("regions") {
        Some(path) => read_bed(path)?,
        None => genome.intervals(),
    };
    let windows = window(&intervals, model.window_size)?;
    if windows.is_empty() {
        anyhow::bail!("no windows of size {} to score", model.window_size);
    }

    eprintln!("Scoring {} windows", windows.len());

    //----------------------------
    // Score
    //----------------------------
    let seqs = windows
        .iter()
        .map(|w| genome.fetch(w.name(), w.start(), w.end()))
        .collect::<anyhow::Result<Vec<&[u8]>>>()?;
    let scores = predict_spectrum_svm(&model, &seqs)?;

    let mut writer = kspec::writer(outfile)?;
    writeln!(writer, "#name\tstart\tend\tscore")?;
    for (w, &score) in windows.iter().zip(scores.iter()) {
        let prediction = Prediction {
            name: w.name().to_string(),
            start: w.start(),
            end: w.end(),
            score,
        };
        writeln!(writer, "{}", prediction)?;
    }

    Ok(())
}
