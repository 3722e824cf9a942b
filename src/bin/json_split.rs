/*
cargo run --bin json_split -- test_no_label.json 10
*/

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use perans_prep::logging;
use perans_prep::split::split_file;

// Split a JSON array (or object) into N contiguous parts under
// <stem>_split/, then reload the parts and check nothing was lost or added.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    // JSON file to split
    input: PathBuf,

    // Number of parts; the last part takes any remainder
    n_splits: usize,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_dir, "json_split")?;
    info!("Splitting {:?} into {} part(s)", args.input, args.n_splits);

    // a round-trip failure surfaces here as an error, after the parts were written
    let outcome = split_file(&args.input, args.n_splits)?;
    let report = &outcome.report;

    println!("Successfully split and validated JSON file.");
    println!("Output files are in: {}", outcome.output_dir.display());
    println!("\nValidation results:");
    println!("total_items_original: {}", report.total_items_original);
    println!("total_items_split: {}", report.total_items_split);
    println!("missing_items_count: {}", report.missing_items_count);
    println!("extra_items_count: {}", report.extra_items_count);
    println!("is_valid: {}", report.is_valid);
    println!("split_files_created: {}", report.split_files_created);

    Ok(())
}
