use std::fmt;
use std::io;
use std::ops::Range;
use std::path::PathBuf;

use thiserror::Error;

/// All errors produced while building a Strive bundle.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A manifest entry points at a file that does not exist.
    #[error("missing file: {}", path.display())]
    MissingFile { path: PathBuf },

    /// A named auxiliary asset is absent from its source directory.
    #[error("asset not found: {name} (looked in {})", dir.display())]
    AssetNotFound { name: String, dir: PathBuf },

    /// Asset names are bare filenames; anything with a path component is refused.
    #[error("invalid asset name '{0}': expected a bare filename")]
    InvalidAssetName(String),

    /// The same file is listed twice in one manifest.
    #[error("duplicate manifest entry '{}' in profile '{profile}'", path.display())]
    DuplicateEntry { profile: String, path: PathBuf },

    #[error("unknown profile '{name}' (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A `--profiles` file failed to parse.
    #[error("invalid profiles file '{}': {source}", path.display())]
    Profiles {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("file watcher failed: {0}")]
    Watch(#[from] notify::Error),

    #[error("cannot serve on {addr}: {message}")]
    Serve { addr: String, message: String },
}

pub type Result<T> = std::result::Result<T, BuildError>;

/// Shorthand constructors.
impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map a read failure to `MissingFile` when the path is absent, `Io` otherwise.
    pub fn from_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::MissingFile { path }
        } else {
            Self::Io { path, source }
        }
    }

    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::MissingFile { .. })
    }
}

/// Errors produced while reading a sketch.
#[derive(Debug)]
pub struct SketchError {
    pub kind: SketchErrorKind,
    pub span: Option<Range<usize>>,
}

#[derive(Debug)]
pub enum SketchErrorKind {
    /// The lexer met a character or sequence it does not recognise.
    UnrecognizedToken(String),
    /// A quote opened a string that never closes on its line.
    UnterminatedString,
}

impl fmt::Display for SketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SketchErrorKind::UnrecognizedToken(tok) => write!(f, "unrecognized token: {tok}"),
            SketchErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
        }?;

        if let Some(span) = &self.span {
            write!(f, " (at byte {}..{})", span.start, span.end)?;
        }

        Ok(())
    }
}

impl std::error::Error for SketchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_names_the_path() {
        let err = BuildError::MissingFile {
            path: PathBuf::from("lib/C.js"),
        };
        assert_eq!(err.to_string(), "missing file: lib/C.js");
    }

    #[test]
    fn from_read_classifies_not_found() {
        let err = BuildError::from_read("x.js", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_missing_file());

        let err = BuildError::from_read("x.js", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, BuildError::Io { .. }));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let err = BuildError::UnknownProfile {
            name: "lite".into(),
            available: "full, host".into(),
        };
        assert_eq!(err.to_string(), "unknown profile 'lite' (available: full, host)");
    }

    #[test]
    fn sketch_error_shows_span() {
        let err = SketchError {
            kind: SketchErrorKind::UnrecognizedToken("$".into()),
            span: Some(4..5),
        };
        assert_eq!(err.to_string(), "unrecognized token: $ (at byte 4..5)");
    }
}
