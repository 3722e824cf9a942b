/*
cargo run --bin clean_up -- \
    -i "Train and Val/train.json" \
    -o train_cleaned.json

cargo run --bin clean_up -- -i train.json -o train_cleaned.json -k raw_text -k context
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use perans_prep::clean::strip_keys;
use perans_prep::io::{read_json_array, write_json_pretty};
use perans_prep::logging;

// Remove raw fields (raw_text by default) from every QA entry
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long)]
    input: PathBuf,

    // Output file (overwritten if it exists)
    #[arg(short, long)]
    output: PathBuf,

    // Keys to drop, may repeat
    #[arg(short, long = "key", value_name = "KEY", default_value = "raw_text")]
    keys: Vec<String>,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_dir, "clean_up")?;

    let mut data = read_json_array(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let removed = strip_keys(&mut data, &args.keys);
    info!("Removed {removed} field(s) {:?} from {} entries", args.keys, data.len());

    write_json_pretty(&args.output, &data)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!("Processed {} entries", data.len());
    println!("Cleaned data saved to {}", args.output.display());
    Ok(())
}
