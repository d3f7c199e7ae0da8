// src/dispatch.rs
//
// Resolves the CLI's in/out tokens to concrete producers and collectors. A
// token is either a literal format name (stream over stdin/stdout) or a
// filesystem path dispatched on its extension.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::PipelineError;
use crate::formats;
use crate::pipeline::{Collector, Producer};

/// Resolve an input token. `csv`, `json` and `jsonl` read stdin; anything
/// else is opened as a file and dispatched on its extension.
pub fn producer_for(token: &str) -> Result<Producer, PipelineError> {
    match token {
        "csv" => return Ok(Box::new(formats::csv::producer(io::stdin()))),
        "json" => return Ok(Box::new(formats::json::producer(io::stdin()))),
        "jsonl" => return Ok(Box::new(formats::jsonl::producer(io::stdin()))),
        _ => {}
    }

    let path = Path::new(token);
    let file = File::open(path).map_err(|source| PipelineError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;

    match extension(path) {
        "csv" => Ok(Box::new(formats::csv::producer(file))),
        "json" => Ok(Box::new(formats::json::producer(file))),
        "jsonl" => Ok(Box::new(formats::jsonl::producer(file))),
        _ => Err(PipelineError::UnknownInputFormat(token.to_string())),
    }
}

/// Resolve an output token. Literal format names write to stdout; paths are
/// dispatched on extension and refused outright if the file already exists.
pub fn collector_for(token: &str) -> Result<Collector, PipelineError> {
    match token {
        "csv" => return Ok(Box::new(formats::csv::collector(io::stdout()))),
        "json" => return Ok(Box::new(formats::json::collector(io::stdout()))),
        "jsonl" => return Ok(Box::new(formats::jsonl::collector(io::stdout()))),
        "tab" | "tabular" | "table" => {
            return Ok(Box::new(formats::table::collector(io::stdout())))
        }
        _ => {}
    }

    let path = Path::new(token);
    if path.exists() {
        return Err(PipelineError::OutputExists(path.to_path_buf()));
    }

    // Pick the format before touching the filesystem so an unknown
    // extension doesn't leave an empty file behind.
    let make: fn(File) -> Collector = match extension(path) {
        "csv" => |file| Box::new(formats::csv::collector(file)),
        "json" => |file| Box::new(formats::json::collector(file)),
        "jsonl" => |file| Box::new(formats::jsonl::collector(file)),
        "tab" | "tabular" | "table" => |file| Box::new(formats::table::collector(file)),
        _ => return Err(PipelineError::UnknownOutputFormat(token.to_string())),
    };

    let file = File::create(path).map_err(|source| PipelineError::CreateOutput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(make(file))
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}
