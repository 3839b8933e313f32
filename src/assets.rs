//! Auxiliary assets: source maps and library binaries copied next to the bundle.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{BuildError, Result};

/// Where `filename` lands under `dest_dir`.
pub fn destination(filename: &str, dest_dir: &Path) -> Result<PathBuf> {
    check_name(filename)?;
    Ok(dest_dir.join(filename))
}

/// Fail unless `filename` exists in `source_dir`.
pub fn ensure_present(filename: &str, source_dir: &Path) -> Result<PathBuf> {
    check_name(filename)?;
    let src = source_dir.join(filename);
    if src.is_file() {
        Ok(src)
    } else {
        Err(BuildError::AssetNotFound {
            name: filename.to_string(),
            dir: source_dir.to_path_buf(),
        })
    }
}

/// Copy `source_dir/filename` to `dest_dir/filename` byte for byte.
///
/// Always copies; returns the number of bytes written.
pub fn copy_asset(filename: &str, source_dir: &Path, dest_dir: &Path) -> Result<u64> {
    let src = ensure_present(filename, source_dir)?;
    let dst = destination(filename, dest_dir)?;
    let bytes = fs::copy(&src, &dst).map_err(|e| BuildError::io(&dst, e))?;
    debug!(asset = filename, bytes, "copied asset");
    Ok(bytes)
}

fn check_name(filename: &str) -> Result<()> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(BuildError::InvalidAssetName(filename.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copy_preserves_bytes_and_name() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let payload = [0u8, 159, 146, 150, b'\n', 0xff];
        fs::write(src.path().join("skulpt.min.js.map"), payload).unwrap();

        let n = copy_asset("skulpt.min.js.map", src.path(), dst.path()).unwrap();

        assert_eq!(n, payload.len() as u64);
        assert_eq!(fs::read(dst.path().join("skulpt.min.js.map")).unwrap(), payload);
    }

    #[test]
    fn copy_overwrites_existing() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("a.map"), "new").unwrap();
        fs::write(dst.path().join("a.map"), "old and longer").unwrap();

        copy_asset("a.map", src.path(), dst.path()).unwrap();
        assert_eq!(fs::read_to_string(dst.path().join("a.map")).unwrap(), "new");
    }

    #[test]
    fn absent_asset_is_asset_not_found() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let err = copy_asset("p5.min.js", src.path(), dst.path()).unwrap_err();
        assert!(matches!(err, BuildError::AssetNotFound { ref name, .. } if name == "p5.min.js"));
        assert!(!dst.path().join("p5.min.js").exists());
    }

    #[test]
    fn names_with_path_components_rejected() {
        let dir = Path::new("dist");
        for bad in ["../p5.js", "lib/p5.js", "/etc/passwd", "", "."] {
            assert!(
                matches!(destination(bad, dir), Err(BuildError::InvalidAssetName(_))),
                "{bad:?} should be rejected"
            );
        }
        assert_eq!(destination("p5.js", dir).unwrap(), PathBuf::from("dist/p5.js"));
    }
}
