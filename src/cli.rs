// ============================================================================
// AgentCanvas CLI: drive the canvas from a file of JSON commands
// ============================================================================
//
// Usage examples:
//   agentcanvas --script session.jsonl --output drawing
//   agentcanvas -s session.jsonl -o drawing --format bmp --config config.json
//   cat session.jsonl | agentcanvas -s - -o drawing -v
//
// One command per line, e.g.
//   {"action": "draw_line", "data": {"start": {"x": 0, "y": 0}, "end": {"x": 10, "y": 10}}}
// Blank lines and lines starting with `#` are skipped. Each command prints
// `ok: <message>` or `error: <message>` on stdout.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::info;

use crate::actions::{self, Outcome};
use crate::config::Config;
use crate::engine::CanvasEngine;
use crate::io::SaveFormat;

#[cfg(test)]
#[path = "cli_test.rs"]
mod cli_test;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// AgentCanvas headless command runner.
#[derive(Parser, Debug)]
#[command(
    name = "agentcanvas",
    version,
    about = "Run JSON drawing commands against a layered canvas",
    long_about = "Reads one JSON command per line, applies each to a fresh canvas and\n\
                  reports the outcome. Optionally exports the final image.\n\n\
                  Example:\n  \
                  agentcanvas --script session.jsonl --output drawing --format png"
)]
pub struct CliArgs {
    /// Command file, one JSON command per line. Use `-` for stdin.
    #[arg(short, long, value_name = "FILE")]
    pub script: String,

    /// Configuration file. Missing file means defaults.
    #[arg(short, long, default_value = "config.json", value_name = "FILE")]
    pub config: PathBuf,

    /// Export the final composite under this name (no extension).
    #[arg(short, long, value_name = "NAME")]
    pub output: Option<String>,

    /// Export format: png, jpg, bmp, tga.
    #[arg(short, long, default_value = "png", value_name = "FORMAT")]
    pub format: String,

    /// Debug-level logging and a per-command timing line.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Totals from one script run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScriptSummary {
    pub succeeded: usize,
    pub failed: usize,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the script and return an OS exit code.
/// `0` = every command (and the export) succeeded, `1` otherwise.
pub fn run(args: CliArgs) -> ExitCode {
    let mut config = match Config::load_or_default(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config.merge_with_env();

    let format: SaveFormat = match args.format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut engine = match CanvasEngine::new(config.engine_settings()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let reader: Box<dyn BufRead> = if args.script == "-" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        match std::fs::File::open(&args.script) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => {
                eprintln!("error: could not read script '{}': {}", args.script, e);
                return ExitCode::FAILURE;
            }
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = match run_script(&mut engine, &config, reader, &mut out, args.verbose) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(succeeded = summary.succeeded, failed = summary.failed, "script finished");

    let mut export_failed = false;
    if let Some(name) = &args.output {
        let outcome: Outcome = engine
            .export(name, format, config.settings.export_dir.as_deref())
            .into();
        export_failed = !outcome.success;
        let _ = print_outcome(&mut out, &outcome);
    }

    if summary.failed > 0 || export_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Script processing
// ============================================================================

/// Dispatch every command line from `input`, writing one outcome line per
/// command to `out`.
pub fn run_script<R: BufRead, W: Write>(
    engine: &mut CanvasEngine,
    config: &Config,
    input: R,
    out: &mut W,
    verbose: bool,
) -> std::io::Result<ScriptSummary> {
    let mut summary = ScriptSummary::default();

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let start = Instant::now();
        let outcome = actions::dispatch_json(engine, config, trimmed);
        if outcome.success {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        print_outcome(out, &outcome)?;
        if verbose {
            writeln!(out, "  ({:.1}ms)", start.elapsed().as_secs_f64() * 1000.0)?;
        }
    }

    Ok(summary)
}

fn print_outcome<W: Write>(out: &mut W, outcome: &Outcome) -> std::io::Result<()> {
    let tag = if outcome.success { "ok" } else { "error" };
    writeln!(out, "{}: {}", tag, outcome.message)
}
