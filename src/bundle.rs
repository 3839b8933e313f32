//! Byte-level concatenation of a manifest into one artifact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BuildError, Result};
use crate::manifest::Entry;
use crate::shim;

/// Append `content` followed by one blank line.
///
/// Content that already ends in a newline needs a single `\n` to leave a
/// blank line behind it; otherwise the line is terminated first.
pub fn push_section(out: &mut String, content: &str) {
    out.push_str(content);
    if content.ends_with('\n') {
        out.push('\n');
    } else {
        out.push_str("\n\n");
    }
}

/// Concatenate files in order. Paths are used as given.
pub fn concatenate<P: AsRef<Path>>(files: &[P]) -> Result<String> {
    let mut package = String::new();
    for path in files {
        let path = path.as_ref();
        let content = read_source(path)?;
        push_section(&mut package, &content);
    }
    Ok(package)
}

/// Concatenate a manifest whose file entries are relative to `root`.
///
/// The `Shim` entry expands to the generated integration shim.
pub fn concatenate_manifest(root: &Path, manifest: &[Entry]) -> Result<String> {
    let mut package = String::new();
    for entry in manifest {
        match entry {
            Entry::File(rel) => {
                let content = read_source(&root.join(rel)).map_err(|e| relabel(e, rel))?;
                push_section(&mut package, &content);
            }
            Entry::Shim => {
                let js = shim::emit::render_shim();
                debug!(bytes = js.len(), "appending generated shim");
                push_section(&mut package, &js);
            }
        }
    }
    Ok(package)
}

fn read_source(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| BuildError::from_read(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "read source");
    Ok(content)
}

/// Report missing files by their manifest path rather than the joined one.
fn relabel(err: BuildError, rel: &Path) -> BuildError {
    match err {
        BuildError::MissingFile { .. } => BuildError::MissingFile {
            path: rel.to_path_buf(),
        },
        other => other,
    }
}

/// Overwrite `dest` with `text`.
///
/// The text is staged next to the destination and renamed into place, so the
/// destination is either the previous file or the complete new one. Any
/// existing destination is removed before the rename.
pub fn write(text: &str, dest: &Path) -> Result<()> {
    let staged = staging_path(dest);
    fs::write(&staged, text).map_err(|e| BuildError::io(&staged, e))?;

    if dest.exists() {
        if let Err(e) = fs::remove_file(dest) {
            let _ = fs::remove_file(&staged);
            return Err(BuildError::io(dest, e));
        }
    }
    fs::rename(&staged, dest).map_err(|e| {
        let _ = fs::remove_file(&staged);
        BuildError::io(dest, e)
    })
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn two_files_get_blank_line_separators() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("A.js");
        let b = dir.path().join("B.js");
        fs::write(&a, "var x=1;").unwrap();
        fs::write(&b, "var y=2;").unwrap();

        let out = concatenate(&[&a, &b]).unwrap();
        assert_eq!(out, "var x=1;\n\nvar y=2;\n\n");
    }

    #[test]
    fn newline_terminated_files_get_one_extra_newline() {
        let mut out = String::new();
        push_section(&mut out, "a();\n");
        push_section(&mut out, "b();\r\n");
        assert_eq!(out, "a();\n\nb();\r\n\n");
    }

    #[test]
    fn empty_manifest_is_empty_text() {
        let files: [&Path; 0] = [];
        assert_eq!(concatenate(&files).unwrap(), "");
    }

    #[test]
    fn missing_file_reported_by_manifest_path() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("A.js"), "var x=1;").unwrap();

        let manifest = vec![Entry::file("A.js"), Entry::file("C.js")];
        let err = concatenate_manifest(dir.path(), &manifest).unwrap_err();
        match err {
            BuildError::MissingFile { path } => assert_eq!(path, PathBuf::from("C.js")),
            other => panic!("expected MissingFile, got {other}"),
        }
    }

    #[test]
    fn shim_entry_expands_in_place() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("A.js"), "var x=1;\n").unwrap();

        let manifest = vec![Entry::file("A.js"), Entry::Shim];
        let out = concatenate_manifest(dir.path(), &manifest).unwrap();
        assert!(out.starts_with("var x=1;\n\n"));
        assert!(out.contains("function runCode("));
        assert!(out.ends_with("\n\n"));
    }

    #[test]
    fn write_replaces_existing_file_and_leaves_no_staging() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("strive.js");
        fs::write(&dest, "stale").unwrap();

        write("fresh", &dest).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "fresh");
        assert!(!dir.path().join("strive.js.part").exists());
    }
}
