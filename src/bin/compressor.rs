use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use scorepack::io_utils::{
    io_cli_error, load_config, read_entries, require_json_extension, scorepack_cli_error,
};
use scorepack::{compress, CompressionReport, IncrementalLogger};

/// Compress a JSON scoreboard log into a baseline + delta artifact.
#[derive(Parser)]
struct Args {
    /// Input .json log: an array of {t, data} entries
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Write the line-oriented form instead of compact JSON
    #[arg(long)]
    lines: bool,
    /// Build the log entry by entry, as a live logger would
    #[arg(long)]
    stream: bool,
    /// JSON config describing where the clock and lane fields live
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the summary as JSON on stdout
    #[arg(long)]
    json: bool,
    /// Skip writing the output file
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    require_json_extension(&args.input)?;
    let config = load_config(args.config.as_deref())?;
    let (entries, input_bytes) = read_entries(&args.input)?;

    let start = Instant::now();
    let log = if args.stream {
        let mut logger = IncrementalLogger::new(config);
        for entry in &entries {
            logger
                .push(entry)
                .map_err(|e| scorepack_cli_error("streaming compression failed", e))?;
        }
        logger.finish()
    } else {
        compress(&entries, &config).map_err(|e| scorepack_cli_error("compression failed", e))?
    };
    let elapsed = start.elapsed();

    let text = if args.lines { log.to_lines() } else { log.to_json() }
        .map_err(|e| scorepack_cli_error("serializing output", e))?;
    if args.dry_run {
        log::info!("(dry run) skipping write of {} bytes", text.len());
    } else {
        fs::write(&args.output, &text)
            .map_err(|e| io_cli_error("writing output file", &args.output, e))?;
    }

    let report = CompressionReport::measure(&log, input_bytes)?;
    if args.json {
        let summary = serde_json::json!({
            "report": report,
            "elapsed_ms": elapsed.as_millis(),
            "fingerprint": log.fingerprint()?,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        eprintln!("{}: {} in {:.2?}", args.input.display(), report, elapsed);
    }
    Ok(())
}
