use clap::Parser;
use enpakk::{
    io_utils::{init_logging, io_cli_error, CliError},
    CandidateTable, MAX_CANDIDATES,
};
use std::path::PathBuf;

/// Write per-hash candidate bucket occupancy to CSV and flag buckets
/// truncated by the cap.
#[derive(Parser)]
struct Args {
    /// Output CSV path
    output: PathBuf,
    #[arg(long, default_value_t = MAX_CANDIDATES)]
    max_candidates: usize,
    #[arg(long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);
    let table = CandidateTable::with_cap(args.max_candidates);

    let mut wtr = csv::Writer::from_path(&args.output).map_err(|e| CliError {
        msg: format!("Error creating csv '{}': {e}", args.output.display()),
        source: Some(Box::new(e)),
    })?;
    for stats in table.bucket_report() {
        wtr.serialize(&stats)?;
    }
    wtr.flush()
        .map_err(|e| io_cli_error("writing csv", &args.output, e))?;

    let truncated = table.truncated_buckets();
    if !truncated.is_empty() {
        eprintln!(
            "{} of 256 buckets exceed the cap of {}",
            truncated.len(),
            args.max_candidates
        );
    }
    Ok(())
}
