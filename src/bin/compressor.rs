use clap::Parser;
use enpakk::{
    io_utils::{init_logging, io_cli_error},
    EncodedStream,
};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Fingerprint a file into the .enpakk format (CRC-8 per 2-byte block).
#[derive(Parser)]
struct Args {
    /// Input file
    input: PathBuf,
    /// Output .enpakk file
    output: PathBuf,
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
    let data =
        fs::read(&args.input).map_err(|e| io_cli_error("reading input file", &args.input, e))?;
    let stream = EncodedStream::encode(&data);
    info!(
        checksum = format_args!("{:#010x}", stream.expected_checksum),
        blocks = stream.block_count(),
        "encoded {} bytes",
        data.len()
    );
    fs::write(&args.output, stream.to_bytes())
        .map_err(|e| io_cli_error("writing output file", &args.output, e))?;
    Ok(())
}
