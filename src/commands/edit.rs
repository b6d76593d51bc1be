use super::{default_output, open_version, write_bytes};
use crate::config::EditorConfig;
use crate::edit::{EditOperation, Outcome};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Apply one operation to a file and save the result, returning where it went.
pub fn apply_to_file(
    input: &Path,
    operation: &EditOperation,
    output: Option<&Path>,
    config: &EditorConfig,
) -> Result<(PathBuf, Outcome)> {
    let version = open_version(input)?;
    let outcome = operation.apply(&version, config)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input, operation.output_prefix()));
    write_bytes(outcome.version.bytes(), &output)?;
    Ok((output, outcome))
}

pub fn run(
    input: &Path,
    operation: EditOperation,
    output: Option<&Path>,
    config: &EditorConfig,
) -> Result<()> {
    let (output, outcome) = apply_to_file(input, &operation, output, config)?;

    println!("{}", outcome.message);
    println!(
        "Saved {} page(s) to {}",
        outcome.version.page_count(),
        output.display()
    );

    Ok(())
}
