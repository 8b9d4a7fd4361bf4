use anyhow::{Context as AnyhowContext, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A text file scheduled for segmentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Name recorded as the chunk source
    pub source: String,
}

/// Expand inputs into the ordered list of files to segment.
///
/// Files are kept in the order given. Directories expand to their `*.txt`
/// files sorted by path. Inputs that do not exist are skipped with a warning.
pub fn discover(inputs: &[PathBuf]) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.exists() {
            log::warn!("Input not found, skipping: {}", input.display());
            continue;
        }

        let meta = fs::metadata(input)
            .with_context(|| format!("failed to inspect {}", input.display()))?;
        if meta.is_dir() {
            let before = files.len();
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_text_file(e.path()))
            {
                let path = entry.path().to_path_buf();
                let source = path
                    .strip_prefix(input)
                    .unwrap_or(path.as_path())
                    .to_string_lossy()
                    .replace('\\', "/");
                files.push(InputFile { path, source });
            }
            if files.len() == before {
                log::warn!("No .txt files under {}", input.display());
            }
        } else if meta.is_file() {
            files.push(InputFile {
                path: input.clone(),
                source: file_name(input),
            });
        }
    }

    Ok(files)
}

/// Read a file as UTF-8 (invalid bytes replaced) with newlines normalized
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(normalize_newlines(&String::from_utf8_lossy(&bytes)))
}

/// Convert `\r\n` and lone `\r` to `\n`
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
