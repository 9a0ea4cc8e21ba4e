//! Build command - split the input stream into the output tree

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use kustomizily_core::{BuildSummary, DryRunSink, FileSink, FsSink, Options, Pipeline};
use tracing::debug;

use crate::error::{CliError, Result};

/// Input path meaning stdin
pub const STDIN: &str = "-";

fn open_input(input: &Path) -> Result<Box<dyn BufRead>> {
    if input.as_os_str() == STDIN {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(input).map_err(|e| CliError::open_input(input, e))?;
    Ok(Box::new(BufReader::new(file)))
}

pub fn run(input: &Path, output: &Path, dry_run: bool, options: Options) -> Result<BuildSummary> {
    debug!(
        input = %input.display(),
        output = %output.display(),
        dry_run,
        max_document_size = options.max_document_size,
        "starting build"
    );

    let mut pipeline = Pipeline::with_options(options);
    pipeline.ingest(open_input(input)?)?;

    let mut sink: Box<dyn FileSink> = if dry_run {
        Box::new(DryRunSink::new(output, io::stdout().lock()))
    } else {
        Box::new(FsSink::new(output))
    };

    Ok(pipeline.finalize(&mut sink)?)
}
