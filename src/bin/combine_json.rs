/*
cargo run --bin combine_json -- claude_answers/spans

cargo run --bin combine_json -- \
    claude_answers/spans \
    -o merged_output.json \
    --log-dir logs
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use perans_prep::io::write_json_pretty;
use perans_prep::logging;
use perans_prep::merge::{discover_shards, merge_with_progress};

// Merge every output_<n>.json shard of a directory into one validated,
// deduplicated array.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    // Directory holding the output_<n>.json shards
    directory: PathBuf,

    // Output file name, written inside the shard directory
    #[arg(short, long, default_value = "merged_output.json")]
    output: String,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = logging::init(&args.log_dir, "combine_json")?;
    info!("Merging shards in {:?}", args.directory);

    // setup problems abort before anything is read
    let shards = discover_shards(&args.directory)?;

    let outcome = merge_with_progress(&shards, |name| println!("Processing {name}..."));

    let output_path = args.directory.join(&args.output);
    write_json_pretty(&output_path, &outcome.records)
        .with_context(|| format!("writing {}", output_path.display()))?;
    info!("Wrote {} records → {:?}", outcome.records.len(), output_path);

    println!("\nProcessing complete!");
    println!("Files processed            : {}", outcome.files_processed);
    println!("Records seen               : {}", outcome.records_seen);
    println!("Total unique entries       : {}", outcome.records.len());
    println!("Duplicates skipped         : {}", outcome.duplicates_skipped);
    println!("Output written to          : {}", output_path.display());
    println!("Log file                   : {}", log_path.display());

    if !outcome.diagnostics.is_empty() {
        println!("\nWarnings/Errors encountered:");
        for diagnostic in &outcome.diagnostics {
            println!("- {diagnostic}");
        }
    }

    Ok(())
}
