use clap::Parser;
use std::fs;
use std::path::PathBuf;

use scorepack::decompress;
use scorepack::io_utils::{io_cli_error, load_config, read_compressed, scorepack_cli_error};

/// Restore the original JSON scoreboard log from a compressed artifact.
#[derive(Parser)]
struct Args {
    /// Compressed input (compact or line form)
    input: PathBuf,
    /// Output .json path
    output: PathBuf,
    /// Pretty-print the restored entries
    #[arg(long)]
    pretty: bool,
    /// JSON config used when the log was compressed
    #[arg(long)]
    config: Option<PathBuf>,
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
    let config = load_config(args.config.as_deref())?;
    let log = read_compressed(&args.input)?;
    let entries =
        decompress(&log, &config).map_err(|e| scorepack_cli_error("decompression failed", e))?;
    let text = if args.pretty {
        serde_json::to_string_pretty(&entries)?
    } else {
        serde_json::to_string(&entries)?
    };
    fs::write(&args.output, text)
        .map_err(|e| io_cli_error("writing output file", &args.output, e))?;
    log::info!("restored {} entries to {}", entries.len(), args.output.display());
    Ok(())
}
