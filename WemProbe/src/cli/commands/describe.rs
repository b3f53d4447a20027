//! CLI command for describing WEM streams

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::json;

use crate::batch::{BatchProbeResult, describe_files, find_wem_files};
use crate::cli::progress::{BOOKS, NOTE, print_done, print_step, simple_bar};
use crate::describe::render;
use crate::wwise::ParseOptions;

use super::CodebookArgs;

/// Output switches for `wemprobe describe`
#[derive(Debug, Clone)]
pub struct DescribeOptions {
    pub max_length: Option<usize>,
    pub json: bool,
    pub ignore_loops: bool,
    pub progress: bool,
}

/// Expand directories into the .wem files below them.
fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            inputs.extend(find_wem_files(path));
        } else {
            inputs.push(path.clone());
        }
    }
    inputs
}

pub fn execute(paths: &[PathBuf], options: &DescribeOptions, codebooks: &CodebookArgs) -> anyhow::Result<()> {
    let start = Instant::now();
    let inputs = collect_inputs(paths);
    let show_progress = options.progress && !options.json && inputs.len() > 1;

    if show_progress {
        print_step(1, 2, BOOKS, "Loading codebooks...");
    }
    let config = codebooks.load_config()?;
    let registry = config.codebooks.load_registry()?;
    if registry.is_empty() {
        tracing::warn!("No codebook libraries found; only self-contained setups will parse");
    }

    let parse_options = ParseOptions {
        ignore_loops: options.ignore_loops || config.describe.ignore_loops,
        stream_name: None,
    };
    let max_length = options.max_length.unwrap_or(config.describe.max_length);

    let batch = if show_progress {
        print_step(2, 2, NOTE, "Describing streams...");
        let pb = simple_bar(inputs.len() as u64, "Describing");
        let batch = describe_files(&inputs, &registry, &parse_options, max_length, |_| pb.inc(1));
        pb.finish_and_clear();
        batch
    } else {
        describe_files(&inputs, &registry, &parse_options, max_length, |_| {})
    };

    if options.json {
        print_json(&batch)?;
    } else {
        print_text(&batch, inputs.len() > 1);
    }

    if show_progress {
        print_done(start.elapsed());
    }

    if batch.fail_count > 0 {
        anyhow::bail!("{} of {} files failed", batch.fail_count, inputs.len());
    }
    Ok(())
}

fn print_text(batch: &BatchProbeResult, multiple: bool) {
    let mut first = true;
    for result in &batch.results {
        match &result.outcome {
            Ok(description) => {
                if multiple {
                    if !first {
                        println!();
                    }
                    println!("==> {} <==", result.path.display());
                }
                print!("{}", render(description));
                first = false;
            }
            Err(e) => report_error(&result.path, e),
        }
    }
}

fn print_json(batch: &BatchProbeResult) -> anyhow::Result<()> {
    let entries: Vec<_> = batch
        .results
        .iter()
        .map(|result| match &result.outcome {
            Ok(description) => json!({
                "path": result.path.display().to_string(),
                "description": description,
                "text": render(description),
            }),
            Err(e) => {
                report_error(&result.path, e);
                json!({
                    "path": result.path.display().to_string(),
                    "error": { "kind": e.kind().as_str(), "message": e.to_string() },
                })
            }
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

/// `<kind>: <path>: <message>` on stderr
fn report_error(path: &Path, e: &crate::Error) {
    eprintln!("{}: {}: {e}", e.kind(), path.display());
}
