extern crate clap;
use clap::*;

mod cmd_kspec;

fn main() -> anyhow::Result<()> {
    let app = Command::new("kspec")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`kspec` - K-mer SPECtrum classification of genomic windows")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_kspec::window::make_subcommand())
        .subcommand(cmd_kspec::train::make_subcommand())
        .subcommand(cmd_kspec::predict::make_subcommand())
        .subcommand(cmd_kspec::calls::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Intervals:
    * window - Tile BED intervals into fixed-width windows
    * calls  - Threshold window scores and merge positive windows

* Classification:
    * train   - Fit a spectrum-SVM from labeled intervals
    * predict - Score windows with a fitted model

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("window", sub_matches)) => cmd_kspec::window::execute(sub_matches),
        Some(("train", sub_matches)) => cmd_kspec::train::execute(sub_matches),
        Some(("predict", sub_matches)) => cmd_kspec::predict::execute(sub_matches),
        Some(("calls", sub_matches)) => cmd_kspec::calls::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
