/*
cargo run --bin reformat -- \
    -i "Train and Val/train_cleaned.json" \
    -o reformatted_answers.json
*/

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use perans_prep::io::{file_label, read_json};
use perans_prep::logging;
use perans_prep::reformat::{as_records, backup_existing, reformat_records, render_document};

// Turn raw QA records into <example> input/output pairs with canonical
// spans and summaries
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long)]
    input: PathBuf,

    // Existing output is moved to <output>.json.bak first
    #[arg(short, long, default_value = "reformatted_answers.json")]
    output: PathBuf,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_dir, "reformat")?;

    if !args.input.exists() {
        bail!("Input file {} not found", args.input.display());
    }

    match backup_existing(&args.output) {
        Ok(Some(backup)) => println!("Created backup at {}", backup.display()),
        Ok(None) => {}
        Err(e) => {
            warn!("Could not create backup: {e}");
            println!("Warning: Could not create backup: {e}");
        }
    }

    let source = file_label(&args.input);
    let records = as_records(
        read_json(&args.input).with_context(|| format!("reading {}", args.input.display()))?,
    );
    let total = records.len();

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})",
        )?
        .progress_chars("=>-"),
    );

    let outcome = reformat_records(&records, &source, |_, _, successful| {
        bar.set_message(format!("{successful} successful"));
        bar.inc(1);
    });
    bar.finish_and_clear();
    for failure in &outcome.failures {
        println!("{failure}");
    }

    fs::write(&args.output, render_document(&outcome.examples))
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("Wrote {}/{} examples → {:?}", outcome.examples.len(), total, args.output);

    println!("\nComplete! Processed {}/{} examples successfully", outcome.examples.len(), total);
    println!("File written successfully!");
    Ok(())
}
