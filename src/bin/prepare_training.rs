/*
cargo run --bin prepare_training -- \
    --input data/train_perspectives.json \
    --out-file data/train_tokenized.json \
    --shuffle

cargo run --bin prepare_training -- \
    --input data/test_perspectives.json \
    --out-file data/test_tokenized.json \
    --batch-size 8
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;

use perans_prep::io::{read_json_array, write_json_pretty};
use perans_prep::logging;
use perans_prep::training::{batch_order, PerspectiveDataset, PerspectiveSample, TokenizedExample};

// Tokenize per-perspective samples into fixed-length prompt/label ids, in
// data-loader order
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    // JSON array of {answers, question, Perspective, Summary}
    #[arg(long)]
    input: PathBuf,

    #[arg(long = "out-file", value_name = "PATH")]
    out_file: PathBuf,

    #[arg(long, default_value_t = 1024)]
    max_length: usize,

    #[arg(long, default_value_t = 4)]
    batch_size: usize,

    // Shuffle like the train/valid loaders; leave off for test data
    #[arg(long, default_value_t = false)]
    shuffle: bool,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

#[derive(Serialize)]
struct Batch {
    indices: Vec<usize>,
    examples: Vec<TokenizedExample>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_path = logging::init(&cli.log_dir, "prepare_training")?;
    info!("Starting training data preparation");

    let rows = read_json_array(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let mut samples = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for (i, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<PerspectiveSample>(row) {
            Ok(s) => samples.push(s),
            Err(e) => {
                warn!("Skipping sample {}: {e}", i + 1);
                skipped += 1;
            }
        }
    }

    let dataset = PerspectiveDataset::new(samples, cli.max_length)?;
    let batches = batch_order(dataset.len(), cli.batch_size, cli.shuffle, cli.seed)?;

    let bar = ProgressBar::new(dataset.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )?
        .progress_chars("=>-"),
    );

    let mut output: Vec<Batch> = Vec::with_capacity(batches.len());
    for indices in batches {
        let examples = indices
            .iter()
            .filter_map(|&i| {
                bar.inc(1);
                dataset.get(i)
            })
            .collect();
        output.push(Batch { indices, examples });
    }
    bar.finish_and_clear();

    write_json_pretty(&cli.out_file, &output)
        .with_context(|| format!("writing {}", cli.out_file.display()))?;
    info!("Wrote {} batches → {:?}", output.len(), cli.out_file);

    println!("\n=== Training data summary ===");
    println!("Samples tokenized  : {}", dataset.len());
    println!("Samples skipped    : {}", skipped);
    println!("Batches            : {}", output.len());
    println!("Max length         : {}", cli.max_length);
    println!("Output JSON        : {:?}", cli.out_file);
    println!("Log file           : {:?}", log_path);
    Ok(())
}
