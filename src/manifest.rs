//! Build profiles: named, ordered manifests.
//!
//! A manifest is an ordered list of entries. Order is configuration: every
//! entry that references globals defined by another entry must come after it
//! (p5 before the Strive extensions, Skulpt before its stdlib, everything
//! before the shim). Nothing here infers or reorders.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// One item of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entry {
    /// A source file, relative to the project root.
    File(PathBuf),
    /// The generated integration shim.
    Shim,
}

impl Entry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Entry::File(path.into())
    }

    /// Human-readable label used in reports and logs.
    pub fn label(&self) -> String {
        match self {
            Entry::File(p) => p.display().to_string(),
            Entry::Shim => "<shim>".to_string(),
        }
    }
}

/// A named build configuration producing one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Artifact filename, placed in the output directory.
    pub output: String,
    pub manifest: Vec<Entry>,
    /// Bare filenames copied verbatim from `lib/` to the output directory.
    #[serde(default)]
    pub assets: Vec<String>,
}

impl Profile {
    /// Reject manifests that list the same file twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let mut shim_seen = false;
        for entry in &self.manifest {
            let duplicate = match entry {
                Entry::File(p) => !seen.insert(p.clone()),
                Entry::Shim => std::mem::replace(&mut shim_seen, true),
            };
            if duplicate {
                return Err(BuildError::DuplicateEntry {
                    profile: self.name.clone(),
                    path: PathBuf::from(entry.label()),
                });
            }
        }
        Ok(())
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.manifest.iter().filter_map(|e| match e {
            Entry::File(p) => Some(p.as_path()),
            Entry::Shim => None,
        })
    }
}

const ENGINE: &[&str] = &["lib/p5.js", "lib/p5.sound.min.js"];

/// Everything after the graphics engine and its sound addon, shared by both profiles.
fn runtime_entries() -> Vec<Entry> {
    vec![
        Entry::file("lib/math.js"),
        Entry::file("src/p5.strive.js"),
        Entry::file("lib/skulpt.min.js"),
        Entry::file("lib/skulpt-stdlib.js"),
        Entry::file("lib/jquery-3.5.1.min.js"),
        Entry::Shim,
    ]
}

/// The built-in profiles, in build order.
///
/// - `full` bundles the graphics engine and p5.sound itself.
/// - `host` assumes the host page already loaded p5 and p5.sound, and ships
///   those binaries alongside the artifact for that page to pick up. Neither
///   is also bundled, so each script loads once.
pub fn builtin_profiles() -> Vec<Profile> {
    let mut full_manifest: Vec<Entry> = ENGINE.iter().map(|f| Entry::file(*f)).collect();
    full_manifest.extend(runtime_entries());

    vec![
        Profile {
            name: "full".into(),
            output: "strive.js".into(),
            manifest: full_manifest,
            assets: vec!["p5.sound.min.js.map".into(), "skulpt.min.js.map".into()],
        },
        Profile {
            name: "host".into(),
            output: "strive.host.js".into(),
            manifest: runtime_entries(),
            assets: vec![
                "p5.sound.min.js.map".into(),
                "skulpt.min.js.map".into(),
                "p5.min.js".into(),
                "p5.sound.min.js".into(),
            ],
        },
    ]
}

/// Load profiles from a JSON file holding an array of profiles.
pub fn load_profiles(path: &Path) -> Result<Vec<Profile>> {
    let text = fs::read_to_string(path).map_err(|e| BuildError::from_read(path, e))?;
    let profiles: Vec<Profile> = serde_json::from_str(&text).map_err(|source| BuildError::Profiles {
        path: path.to_path_buf(),
        source,
    })?;
    for p in &profiles {
        p.validate()?;
    }
    Ok(profiles)
}

/// Pick profiles by name, or all of them when `name` is `None`.
pub fn select(profiles: Vec<Profile>, name: Option<&str>) -> Result<Vec<Profile>> {
    let Some(name) = name else {
        return Ok(profiles);
    };
    let available = profiles
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    match profiles.into_iter().find(|p| p.name == name) {
        Some(p) => Ok(vec![p]),
        None => Err(BuildError::UnknownProfile {
            name: name.to_string(),
            available,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_validate() {
        for p in builtin_profiles() {
            p.validate().expect("built-in profile should be valid");
        }
    }

    #[test]
    fn engine_precedes_extensions_in_full() {
        let full = &builtin_profiles()[0];
        let files: Vec<_> = full.files().collect();
        let engine = files.iter().position(|p| *p == Path::new("lib/p5.js")).unwrap();
        let ext = files
            .iter()
            .position(|p| *p == Path::new("src/p5.strive.js"))
            .unwrap();
        assert!(engine < ext);
        assert_eq!(full.manifest.last(), Some(&Entry::Shim));
    }

    #[test]
    fn host_profile_omits_engine() {
        let host = &builtin_profiles()[1];
        assert!(host.files().all(|p| p != Path::new("lib/p5.js")));
        assert_eq!(host.manifest.len(), builtin_profiles()[0].manifest.len() - 2);
    }

    #[test]
    fn host_assets_are_not_also_bundled() {
        for p in builtin_profiles() {
            for file in p.files() {
                let name = file.file_name().and_then(|n| n.to_str()).unwrap();
                assert!(!p.assets.iter().any(|a| a == name), "{}: {name}", p.name);
            }
        }
        let host = &builtin_profiles()[1];
        assert!(host.files().all(|p| p != Path::new("lib/p5.sound.min.js")));
    }

    #[test]
    fn duplicate_entry_rejected() {
        let p = Profile {
            name: "dup".into(),
            output: "dup.js".into(),
            manifest: vec![Entry::file("a.js"), Entry::file("a.js")],
            assets: vec![],
        };
        assert!(matches!(p.validate(), Err(BuildError::DuplicateEntry { .. })));
    }

    #[test]
    fn select_by_name() {
        let picked = select(builtin_profiles(), Some("host")).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].output, "strive.host.js");

        assert_eq!(select(builtin_profiles(), None).unwrap().len(), 2);

        let err = select(builtin_profiles(), Some("lite")).unwrap_err();
        assert!(err.to_string().contains("full, host"));
    }

    #[test]
    fn entries_serialize_as_tagged_values() {
        let json = serde_json::to_string(&vec![Entry::file("lib/p5.js"), Entry::Shim]).unwrap();
        assert_eq!(json, r#"[{"file":"lib/p5.js"},"shim"]"#);
    }
}
