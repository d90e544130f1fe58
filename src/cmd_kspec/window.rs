use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("window")
        .about("Tiles BED intervals into fixed-width windows")
        .after_help(
            r###"
This command splits each interval into adjacent, non-overlapping windows
of exactly --size bases.

Notes:
* Coordinates are 0-based, half-open, as in BED.
* Interval widths are truncated down to the largest multiple of --size;
  the trailing excess is dropped.
* Intervals narrower than --size produce no windows.

Examples:
1. 750 bp windows:
   kspec window regions.bed --size 750 -o windows.bed

2. An interval of width 2300 yields 3 windows covering 2250 bases:
   printf 'chr1\t0\t2300\n' | kspec window stdin --size 750

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input BED file with intervals to tile"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .short('s')
                .value_parser(value_parser!(usize))
                .default_value("750")
                .help("Window width in bases"),
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
    let opt_size = *args.get_one::<usize>("size").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    let intervals = kspec::libs::interval::read_bed(infile)?;
    let windows = kspec::libs::interval::window(&intervals, opt_size)?;

    let mut writer = kspec::writer(outfile)?;
    for w in &windows {
        writeln!(writer, "{}", w.interval())?;
    }

    Ok(())
}
