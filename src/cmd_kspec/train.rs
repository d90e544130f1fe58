use clap::*;
use kspec::libs::fasta::SeqStore;
use kspec::libs::interval::{read_bed, window, Window};
use kspec::libs::spectrum::SpectrumParams;
use kspec::libs::svm::fit_spectrum_svm;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("train")
        .about("Fits a spectrum-SVM from labeled genomic intervals")
        .after_help(
            r###"
Foreground and background intervals are tiled into --window sized windows
(trailing excess dropped), window sequences are fetched from the genome,
and a soft-margin SVM is fitted on the k-mer spectrum kernel.

Notes:
* Coordinates are 0-based, half-open, as in BED.
* Sequences are uppercased on load; k-mers containing symbols outside the
  alphabet (e.g. N) are skipped.
* --sign replaces k-mer counts with presence/absence.
* --balance downsamples the larger class to the size of the smaller one;
  --seed only matters together with --balance.
* Training fails if either class produces zero windows, or if the solver
  exhausts --max-iter passes before reaching --eps.

Examples:
1. Defaults (k=2, 750 bp windows):
   kspec train genome.fa nmi.bed background.bed -o model.json

2. Presence/absence kernel on 4 threads:
   kspec train genome.fa nmi.bed background.bed -k 4 --sign -p 4 -o model.json

"###,
        )
        .arg(
            Arg::new("genome")
                .required(true)
                .index(1)
                .help("Reference genome FASTA file"),
        )
        .arg(
            Arg::new("foreground")
                .required(true)
                .index(2)
                .help("BED file with positive-class intervals"),
        )
        .arg(
            Arg::new("background")
                .required(true)
                .index(3)
                .help("BED file with negative-class intervals"),
        )
        .arg(
            Arg::new("kmer")
                .long("kmer")
                .short('k')
                .value_parser(value_parser!(usize))
                .default_value("2")
                .help("K-mer length"),
        )
        .arg(
            Arg::new("window")
                .long("window")
                .short('w')
                .value_parser(value_parser!(usize))
                .default_value("750")
                .help("Window size in bases"),
        )
        .arg(
            Arg::new("alphabet")
                .long("alphabet")
                .num_args(1)
                .default_value("ACGT")
                .help("Nucleotide alphabet"),
        )
        .arg(
            Arg::new("sign")
                .long("sign")
                .action(ArgAction::SetTrue)
                .help("Presence/absence kernel instead of the frequency kernel"),
        )
        .arg(
            Arg::new("c")
                .long("c")
                .short('c')
                .value_parser(value_parser!(f64))
                .default_value("1.0")
                .help("Soft-margin penalty C"),
        )
        .arg(
            Arg::new("eps")
                .long("eps")
                .value_parser(value_parser!(f64))
                .default_value("0.001")
                .help("Convergence tolerance"),
        )
        .arg(
            Arg::new("max_iter")
                .long("max-iter")
                .value_parser(value_parser!(usize))
                .default_value("1000")
                .help("Solver pass budget"),
        )
        .arg(
            Arg::new("balance")
                .long("balance")
                .action(ArgAction::SetTrue)
                .help("Downsample the larger class to the size of the smaller one"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .default_value("42")
                .help("Random seed for --balance"),
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
                .help("Output model filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let genome_file = args.get_one::<String>("genome").unwrap();
    let fg_file = args.get_one::<String>("foreground").unwrap();
    let bg_file = args.get_one::<String>("background").unwrap();

    let opt_kmer = *args.get_one::<usize>("kmer").unwrap();
    let opt_window = *args.get_one::<usize>("window").unwrap();
    let opt_alphabet = args.get_one::<String>("alphabet").unwrap();
    let is_sign = args.get_flag("sign");
    let opt_c = *args.get_one::<f64>("c").unwrap();
    let opt_eps = *args.get_one::<f64>("eps").unwrap();
    let opt_max_iter = *args.get_one::<usize>("max_iter").unwrap();
    let is_balance = args.get_flag("balance");
    let opt_seed = *args.get_one::<u64>("seed").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    // Set the number of threads for rayon
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;

    let params = SpectrumParams::new(opt_kmer, opt_alphabet, is_sign)?;

    //----------------------------
    // Load
    //----------------------------
    let genome = SeqStore::load(genome_file)?;

    let mut fg_windows = window(&read_bed(fg_file)?, opt_window)?;
    let mut bg_windows = window(&read_bed(bg_file)?, opt_window)?;
    if fg_windows.is_empty() {
        anyhow::bail!("foreground {} produced no training windows", fg_file);
    }
    if bg_windows.is_empty() {
        anyhow::bail!("background {} produced no training windows", bg_file);
    }

    if is_balance {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(opt_seed);
        if fg_windows.len() > bg_windows.len() {
            fg_windows.shuffle(&mut rng);
            fg_windows.truncate(bg_windows.len());
        } else if bg_windows.len() > fg_windows.len() {
            bg_windows.shuffle(&mut rng);
            bg_windows.truncate(fg_windows.len());
        }
    }

    eprintln!(
        "Training on {} foreground and {} background windows",
        fg_windows.len(),
        bg_windows.len()
    );

    //----------------------------
    // Fit
    //----------------------------
    let windows: Vec<&Window> = fg_windows.iter().chain(bg_windows.iter()).collect();
    let mut labels = vec![1.0; fg_windows.len()];
    labels.extend(vec![-1.0; bg_windows.len()]);

    let seqs = windows
        .iter()
        .map(|w| genome.fetch(w.name(), w.start(), w.end()))
        .collect::<anyhow::Result<Vec<&[u8]>>>()?;
    let ids: Vec<String> = windows.iter().map(|w| w.id()).collect();

    let model = fit_spectrum_svm(
        &seqs,
        &ids,
        &labels,
        &params,
        opt_window,
        opt_c,
        opt_eps,
        opt_max_iter,
    )?;

    eprintln!(
        "Converged after {} passes; {} of {} windows are support vectors",
        model.iterations,
        model.support.len(),
        windows.len()
    );

    model.save(outfile)?;

    Ok(())
}
