//! kakurx — replay recorded pulse traces through the New Kaku receiver and
//! print every dispatched command.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kakurx::{Config, DecodedFrame, PulseTrace, Receiver};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
Usage: kakurx [--min-repeats N] [trace.json ...]

Replays recorded pulse traces through the New Kaku (KlikAanKlikUit) decoder
and prints every command that passes repeat validation. With no trace files
given, the configured trace directory is scanned for *.json.";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kakurx=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    tracing::info!("kakurx v{}", VERSION);

    let config = Config::load()?;
    let mut min_repeats = config.min_repeats;
    let mut files: Vec<PathBuf> = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--min-repeats" => {
                let value = args.next().context("--min-repeats needs a value")?;
                min_repeats = value
                    .parse()
                    .with_context(|| format!("invalid repeat count: {value}"))?;
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            other if other.starts_with('-') => {
                anyhow::bail!("unknown option: {other}\n{USAGE}");
            }
            _ => files.push(PathBuf::from(arg)),
        }
    }

    if files.is_empty() {
        files = scan_trace_dir(&config.trace_directory)?;
        if files.is_empty() {
            anyhow::bail!(
                "no trace files given and none found in {:?}",
                config.trace_directory
            );
        }
        tracing::info!(
            "Replaying {} trace(s) from {:?}",
            files.len(),
            config.trace_directory
        );
    }

    for path in &files {
        replay_trace(path, min_repeats)?;
    }

    Ok(())
}

/// All *.json files in the trace directory, sorted by name.
fn scan_trace_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading trace dir {:?}", dir))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Run one trace's edge stream through a fresh receiver and print what it
/// dispatched.
fn replay_trace(path: &Path, min_repeats: u16) -> Result<()> {
    let trace =
        PulseTrace::load(path).with_context(|| format!("loading trace {}", path.display()))?;

    tracing::info!(
        "{}: {} pulses at {}, captured {}",
        path.display(),
        trace.pulse_count(),
        trace.frequency_mhz(),
        trace.timestamp_short()
    );

    let (tx, frames) = std::sync::mpsc::channel();
    let mut receiver = Receiver::new(min_repeats, move |frame| {
        let _ = tx.send(frame);
    });

    let edges = trace.edge_timestamps(100);
    for &edge in &edges {
        receiver.handle_edge(edge);
    }
    // The decoder runs one pulse behind the line; a final synthetic edge
    // flushes the trace's last gap.
    if let Some(&last) = edges.last() {
        receiver.handle_edge(last.wrapping_add(50_000));
    }
    drop(receiver);

    let decoded: Vec<DecodedFrame> = frames.try_iter().collect();
    if decoded.is_empty() {
        println!("{}: no commands decoded", path.display());
    } else {
        for frame in &decoded {
            println!("{}: {}", path.display(), frame);
        }
    }

    Ok(())
}
