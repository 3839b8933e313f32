//! One build invocation: resolve, pre-flight, write, copy.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::assets;
use crate::bundle;
use crate::error::{BuildError, Result};
use crate::manifest::Profile;

/// Locations for a build.
#[derive(Debug, Clone)]
pub struct Project {
    /// Manifest paths are relative to this directory.
    pub root: PathBuf,
    /// Artifacts and assets land here.
    pub out_dir: PathBuf,
    /// Assets are copied from here.
    pub asset_dir: PathBuf,
}

impl Project {
    /// Standard layout: `<root>/lib` for assets, `<root>/dist` for output.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            out_dir: root.join("dist"),
            asset_dir: root.join("lib"),
            root,
        }
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn artifact_path(&self, profile: &Profile) -> PathBuf {
        self.out_dir.join(&profile.output)
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub profile: String,
    pub output: PathBuf,
    pub bytes: usize,
    pub entries: Vec<String>,
    pub assets: Vec<CopiedAsset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CopiedAsset {
    pub name: String,
    pub bytes: u64,
}

/// A profile whose bundle is in memory and whose asset sources all exist.
struct Prepared<'a> {
    profile: &'a Profile,
    package: String,
}

/// Validate, concatenate in memory and check every asset source. Touches nothing on disk.
fn prepare<'a>(project: &Project, profile: &'a Profile) -> Result<Prepared<'a>> {
    profile.validate()?;

    let package = bundle::concatenate_manifest(&project.root, &profile.manifest)?;
    for name in &profile.assets {
        assets::ensure_present(name, &project.asset_dir)?;
    }

    Ok(Prepared { profile, package })
}

fn commit(project: &Project, prepared: Prepared<'_>) -> Result<BuildReport> {
    let Prepared { profile, package } = prepared;

    ensure_dir(&project.out_dir)?;
    let output = project.artifact_path(profile);
    bundle::write(&package, &output)?;
    info!(profile = %profile.name, path = %output.display(), bytes = package.len(), "wrote artifact");

    let mut copied = Vec::with_capacity(profile.assets.len());
    for name in &profile.assets {
        let bytes = assets::copy_asset(name, &project.asset_dir, &project.out_dir)?;
        copied.push(CopiedAsset {
            name: name.clone(),
            bytes,
        });
    }

    Ok(BuildReport {
        profile: profile.name.clone(),
        output,
        bytes: package.len(),
        entries: profile.manifest.iter().map(|e| e.label()).collect(),
        assets: copied,
    })
}

/// Build one profile.
///
/// Nothing under the output directory is touched until the whole bundle is
/// in memory and every asset source is known to exist.
pub fn build(project: &Project, profile: &Profile) -> Result<BuildReport> {
    commit(project, prepare(project, profile)?)
}

/// Build several profiles in order.
///
/// Every profile is prepared before any is written, so a failure in a later
/// profile leaves the output of earlier ones untouched.
pub fn build_all(project: &Project, profiles: &[Profile]) -> Result<Vec<BuildReport>> {
    let prepared = profiles
        .iter()
        .map(|p| prepare(project, p))
        .collect::<Result<Vec<_>>>()?;
    prepared.into_iter().map(|p| commit(project, p)).collect()
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))
}
