use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::path::{Path, PathBuf};

use scorepack::diff::first_difference;
use scorepack::io_utils::{io_cli_error, load_config, read_entries, simple_cli_error};
use scorepack::{compress, decompress, CompressionReport, Config, Entry, IncrementalLogger};

/// Round-trip scoreboard logs through batch and streaming compression and
/// report sizes. Exits non-zero if any log fails to restore exactly.
#[derive(Parser)]
struct Args {
    /// Uncompressed .json logs to audit
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Optional CSV output path for per-file results
    #[arg(long)]
    csv: Option<PathBuf>,
    /// JSON config describing where the clock and lane fields live
    #[arg(long)]
    config: Option<PathBuf>,
}

struct Outcome {
    batch: Result<CompressionReport, String>,
    stream: Result<CompressionReport, String>,
    fingerprint: String,
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

    let mut csv_writer = match &args.csv {
        Some(p) => {
            let f = File::create(p).map_err(|e| io_cli_error("creating csv", p, e))?;
            let mut wtr = csv::Writer::from_writer(f);
            wtr.write_record([
                "file",
                "batch",
                "stream",
                "entries",
                "input_bytes",
                "batch_bytes",
                "stream_bytes",
                "fingerprint",
            ])?;
            Some(wtr)
        }
        None => None,
    };

    let progress = if args.inputs.len() > 1 {
        let bar = ProgressBar::new(args.inputs.len() as u64);
        bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut failures = 0usize;
    for path in &args.inputs {
        progress.set_message(path.display().to_string());
        let (entries, input_bytes) = read_entries(path)?;
        let outcome = audit(&entries, input_bytes, &config)?;

        let status = |r: &Result<CompressionReport, String>| if r.is_ok() { "PASS" } else { "FAIL" };
        progress.suspend(|| {
            for (mode, result) in [("batch", &outcome.batch), ("stream", &outcome.stream)] {
                match result {
                    Ok(report) => println!("{} ({mode}): PASS | {report}", name(path)),
                    Err(why) => println!("{} ({mode}): FAIL | {why}", name(path)),
                }
            }
        });
        if outcome.batch.is_err() || outcome.stream.is_err() {
            failures += 1;
        }

        if let Some(wtr) = csv_writer.as_mut() {
            let bytes = |r: &Result<CompressionReport, String>| {
                r.as_ref().map(|rep| rep.output_bytes.to_string()).unwrap_or_default()
            };
            wtr.write_record([
                name(path),
                status(&outcome.batch).to_string(),
                status(&outcome.stream).to_string(),
                entries.len().to_string(),
                input_bytes.to_string(),
                bytes(&outcome.batch),
                bytes(&outcome.stream),
                outcome.fingerprint.clone(),
            ])?;
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if let Some(wtr) = csv_writer.as_mut() {
        wtr.flush()?;
    }
    if failures > 0 {
        return Err(simple_cli_error(&format!("{failures} log(s) failed the round trip")).into());
    }
    println!("ALL LOGS PASSED");
    Ok(())
}

fn name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn audit(
    entries: &[Entry],
    input_bytes: usize,
    config: &Config,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let batch_log = compress(entries, config)?;
    let fingerprint = batch_log.fingerprint()?;
    let batch = check(entries, &batch_log, input_bytes, config);

    let mut logger = IncrementalLogger::new(config.clone());
    let pushed = entries.iter().try_for_each(|e| logger.push(e));
    let stream = match pushed {
        Ok(()) => check(entries, &logger.finish(), input_bytes, config),
        Err(e) => Err(format!("logger rejected input: {e}")),
    };
    Ok(Outcome {
        batch,
        stream,
        fingerprint,
    })
}

fn check(
    entries: &[Entry],
    log: &scorepack::CompressedLog,
    input_bytes: usize,
    config: &Config,
) -> Result<CompressionReport, String> {
    let restored = decompress(log, config).map_err(|e| e.to_string())?;
    if restored.len() != entries.len() {
        return Err(format!(
            "restored {} entries, expected {}",
            restored.len(),
            entries.len()
        ));
    }
    for (i, (orig, back)) in entries.iter().zip(&restored).enumerate() {
        if orig.t != back.t {
            return Err(format!("first difference at entry {i}: timestamp"));
        }
        if let Some(path) = first_difference(&orig.data, &back.data) {
            return Err(format!("first difference at entry {i} (t={}): {path}", json_of(&orig.t)));
        }
    }
    CompressionReport::measure(log, input_bytes).map_err(|e| e.to_string())
}

fn json_of(v: &scorepack::Value) -> String {
    serde_json::to_string(v).unwrap_or_default()
}
