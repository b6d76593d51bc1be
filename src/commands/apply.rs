use super::{default_output, file_name, open_version, write_bytes};
use crate::config::EditorConfig;
use crate::edit::{apply_script, load_script, EditOperation};
use crate::session::EditSession;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn read_script(path: &Path) -> Result<Vec<EditOperation>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    load_script(&json).with_context(|| format!("Invalid edit script: {}", path.display()))
}

/// Apply a script to `input` and save the final revision.
pub fn apply_file(
    input: &Path,
    operations: &[EditOperation],
    output: Option<&Path>,
    config: &EditorConfig,
) -> Result<(PathBuf, EditSession, Vec<String>)> {
    let version = open_version(input)?;
    let mut session = EditSession::open(file_name(input), version.bytes().to_vec())?;
    let messages = apply_script(&mut session, operations, config)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input, "edited_"));
    write_bytes(session.current().bytes(), &output)?;
    Ok((output, session, messages))
}

pub fn run(
    input: &Path,
    script: &Path,
    output: Option<&Path>,
    config: &EditorConfig,
) -> Result<()> {
    let operations = read_script(script)?;
    let (output, session, messages) = apply_file(input, &operations, output, config)?;

    for (index, message) in messages.iter().enumerate() {
        println!("[{}] {}", index + 1, message);
    }
    if !session.is_modified() {
        tracing::warn!("script left {} unchanged", session.name());
    }
    println!(
        "Saved {} page(s) to {} (was {} page(s))",
        session.current().page_count(),
        output.display(),
        session.original().page_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{build_pdf, page_strings};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.pdf");
        std::fs::write(&input, build_pdf(&["one", "two", "three"])).unwrap();
        let script = dir.path().join("edits.json");
        std::fs::write(
            &script,
            r#"[{"op": "reorder", "order": "3,2,1"}, {"op": "remove", "pages": "1"}]"#,
        )
        .unwrap();

        let operations = read_script(&script).unwrap();
        let (output, session, messages) =
            apply_file(&input, &operations, None, &EditorConfig::default()).unwrap();
        assert_eq!(output, dir.path().join("edited_doc.pdf"));
        assert_eq!(messages.len(), 2);
        assert_eq!(session.history().count(), 2);
        assert_eq!(
            page_strings(&std::fs::read(&output).unwrap()),
            vec!["two", "one"]
        );
    }

    #[test]
    fn test_invalid_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("bad.json");
        std::fs::write(&script, r#"[{"op": "explode"}]"#).unwrap();
        assert!(read_script(&script).is_err());
    }
}
