use clap::Parser;
use enpakk::{
    build_engine,
    io_utils::{enpakk_cli_error, init_logging, io_cli_error},
    Backend, CandidateTable, Config, EncodedStream, SearchDriver,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Reconstruct the original data from an .enpakk file.
#[derive(Parser)]
struct Args {
    /// Input .enpakk file
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Log the expected checksum, table build and search progress
    #[arg(long)]
    verbose: bool,
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Search backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,
    /// Work items per dispatch
    #[arg(long)]
    lanes: Option<usize>,
    /// RNG seed for reproducible searches
    #[arg(long)]
    seed: Option<u64>,
    /// Give up after this many dispatches
    #[arg(long)]
    max_attempts: Option<u64>,
    /// Give up after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Print a JSON search report to stdout
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)
            .map_err(|e| enpakk_cli_error("loading config", e))?,
        None => Config::default(),
    };
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(lanes) = args.lanes {
        config.lanes = lanes;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.max_attempts.is_some() {
        config.max_attempts = args.max_attempts;
    }
    if args.timeout_secs.is_some() {
        config.max_duration_secs = args.timeout_secs;
    }
    config
        .validate()
        .map_err(|e| enpakk_cli_error("checking config", e))?;
    Ok(config)
}

fn spinner(verbose: bool) -> ProgressBar {
    if !verbose {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = load_config(&args)?;

    let data =
        fs::read(&args.input).map_err(|e| io_cli_error("reading input file", &args.input, e))?;
    let stream =
        EncodedStream::decode(&data).map_err(|e| enpakk_cli_error("decoding input", e))?;
    info!(
        expected = format_args!("{:#010x}", stream.expected_checksum),
        blocks = stream.block_count(),
        "input decoded"
    );

    let table = CandidateTable::with_cap(config.max_candidates);
    let mut driver = SearchDriver::new(build_engine(&config))
        .with_budget(config.budget())
        .with_progress(spinner(args.verbose));
    let result = driver.reconstruct(&stream, &table);

    if args.json {
        if let Some(report) = driver.report() {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    let reconstruction = result.map_err(|e| enpakk_cli_error("decompression failed", e))?;

    fs::write(&args.output, reconstruction.to_bytes())
        .map_err(|e| io_cli_error("writing output file", &args.output, e))?;
    info!(bytes = stream.output_len(), "wrote {}", args.output.display());
    Ok(())
}
