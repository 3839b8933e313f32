pub mod assets;
pub mod build;
pub mod bundle;
pub mod error;
pub mod lexer;
pub mod manifest;
pub mod serve;
pub mod shim;
pub mod sketch;
pub mod token;
pub mod watch;

use std::path::Path;

use build::{BuildReport, Project};
use error::Result;
use manifest::Profile;

/// Resolve the profiles to build: from `profiles_file` when given, the
/// built-in ones otherwise, narrowed to `name` when given.
pub fn resolve_profiles(profiles_file: Option<&Path>, name: Option<&str>) -> Result<Vec<Profile>> {
    let profiles = match profiles_file {
        Some(path) => manifest::load_profiles(path)?,
        None => manifest::builtin_profiles(),
    };
    manifest::select(profiles, name)
}

/// Build every built-in profile for the project rooted at `root`.
pub fn build_default(root: &Path) -> Result<Vec<BuildReport>> {
    let project = Project::new(root);
    build::build_all(&project, &manifest::builtin_profiles())
}

/// Check a sketch's source. Returns the analysis and its diagnostics.
pub fn check_sketch(
    source: &str,
    strict: bool,
) -> std::result::Result<(sketch::Sketch, Vec<sketch::Diagnostic>), error::SketchError> {
    let analysis = sketch::analyze(source)?;
    let diags = analysis.check(strict);
    Ok((analysis, diags))
}
