//! A small static server for trying a sketch against a built bundle.
//!
//! Serves the output directory, a host page that loads the artifact, and the
//! sketch at `/sketch.py` where the shim's `runCode()` fetches it.

use std::fs;
use std::path::{Path, PathBuf};

use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, warn};

use crate::error::{BuildError, Result};
use crate::manifest::Profile;

pub struct ServeConfig {
    pub port: u16,
    /// Directory holding the built artifact and its assets.
    pub out_dir: PathBuf,
    /// Artifact filename the host page loads.
    pub artifact: String,
    /// Scripts the host page loads before the artifact.
    pub preload: Vec<String>,
    pub sketch: Option<PathBuf>,
}

#[derive(Debug, PartialEq)]
pub enum Route {
    Index,
    Sketch,
    File(String),
    NotFound,
}

/// Map a request URL to what should answer it.
pub fn route(url: &str) -> Route {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path {
        "/" | "/index.html" => Route::Index,
        "/sketch.py" => Route::Sketch,
        _ => {
            let name = path.trim_start_matches('/');
            let bare = !name.is_empty()
                && !name.contains(['/', '\\'])
                && name != "."
                && name != "..";
            if bare {
                Route::File(name.to_string())
            } else {
                Route::NotFound
            }
        }
    }
}

pub fn content_type(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("js") => "text/javascript",
        Some("map") | Some("json") => "application/json",
        Some("html") => "text/html; charset=utf-8",
        Some("py") => "text/x-python; charset=utf-8",
        Some("css") => "text/css",
        _ => "application/octet-stream",
    }
}

/// Script assets the host page must load before the artifact.
///
/// An asset whose file name is already bundled by the manifest is skipped.
pub fn preload_scripts(profile: &Profile) -> Vec<String> {
    let bundled: Vec<&str> = profile
        .files()
        .filter_map(|f| f.file_name().and_then(|n| n.to_str()))
        .collect();
    profile
        .assets
        .iter()
        .filter(|a| a.ends_with(".js") && !bundled.contains(&a.as_str()))
        .cloned()
        .collect()
}

/// The host page: a canvas holder, then the scripts in load order.
pub fn index_page(artifact: &str, preload: &[String]) -> String {
    let mut scripts = String::new();
    for src in preload.iter().map(String::as_str).chain([artifact]) {
        scripts.push_str(&format!("    <script src=\"/{src}\"></script>\n"));
    }
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Strive sketch</title>
  </head>
  <body>
    <div id="sketch-holder"></div>
{scripts}  </body>
</html>
"#
    )
}

/// Serve until the process is stopped. Requests are answered one at a time.
pub fn serve(config: &ServeConfig) -> Result<()> {
    let addr = format!("127.0.0.1:{}", config.port);
    let server = Server::http(&addr).map_err(|e| BuildError::Serve {
        addr: addr.clone(),
        message: e.to_string(),
    })?;

    eprintln!("Strive dev server");
    eprintln!("  serving:  {}", config.out_dir.display());
    if let Some(sketch) = &config.sketch {
        eprintln!("  sketch:   {}", sketch.display());
    }
    eprintln!("  page:     http://localhost:{}/", config.port);

    for request in server.incoming_requests() {
        respond(config, request);
    }
    Ok(())
}

fn respond(config: &ServeConfig, request: Request) {
    let url = request.url().to_string();
    let route = route(&url);
    debug!(%url, ?route, "request");

    let reply = match route {
        Route::Index => Some((
            index_page(&config.artifact, &config.preload).into_bytes(),
            content_type("index.html"),
        )),
        Route::Sketch => config
            .sketch
            .as_deref()
            .and_then(read)
            .map(|bytes| (bytes, content_type("sketch.py"))),
        Route::File(name) => read(&config.out_dir.join(&name)).map(|b| (b, content_type(&name))),
        Route::NotFound => None,
    };

    let result = match reply {
        Some((bytes, ctype)) => {
            let mut response = Response::from_data(bytes);
            if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], ctype.as_bytes()) {
                response = response.with_header(header);
            }
            request.respond(response)
        }
        None => request.respond(Response::from_string("Not Found").with_status_code(404)),
    };
    if let Err(e) = result {
        warn!(%url, error = %e, "failed to respond");
    }
}

fn read(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "not served");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::builtin_profiles;

    #[test]
    fn routes() {
        assert_eq!(route("/"), Route::Index);
        assert_eq!(route("/?v=2"), Route::Index);
        assert_eq!(route("/sketch.py"), Route::Sketch);
        assert_eq!(route("/strive.js"), Route::File("strive.js".into()));
        assert_eq!(route("/../secret"), Route::NotFound);
        assert_eq!(route("/a/b.js"), Route::NotFound);
        assert_eq!(route("/.."), Route::NotFound);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type("strive.js"), "text/javascript");
        assert_eq!(content_type("skulpt.min.js.map"), "application/json");
        assert_eq!(content_type("blob"), "application/octet-stream");
    }

    #[test]
    fn index_loads_preload_then_artifact() {
        let page = index_page("strive.host.js", &["p5.min.js".into()]);
        let p5 = page.find("/p5.min.js").unwrap();
        let bundle = page.find("/strive.host.js").unwrap();
        assert!(p5 < bundle);
        assert!(page.contains(r#"<div id="sketch-holder"></div>"#));
    }

    fn script_sources(page: &str) -> Vec<&str> {
        page.split("<script src=\"/")
            .skip(1)
            .filter_map(|s| s.split('"').next())
            .collect()
    }

    #[test]
    fn each_script_loads_once_per_profile() {
        for profile in builtin_profiles() {
            let preload = preload_scripts(&profile);
            let page = index_page(&profile.output, &preload);
            let sources = script_sources(&page);

            let mut seen = std::collections::BTreeSet::new();
            for src in &sources {
                assert!(seen.insert(*src), "{}: {src} loaded twice", profile.name);
            }
            for file in profile.files() {
                let name = file.file_name().and_then(|n| n.to_str()).unwrap();
                assert!(!sources.contains(&name), "{}: {name} bundled and preloaded", profile.name);
            }
        }
    }

    #[test]
    fn host_page_preloads_engine_binaries() {
        let host = builtin_profiles().into_iter().find(|p| p.name == "host").unwrap();
        assert_eq!(preload_scripts(&host), vec!["p5.min.js", "p5.sound.min.js"]);
    }

    #[test]
    fn preload_skips_assets_already_bundled() {
        let mut p = builtin_profiles().remove(0);
        p.assets.push("p5.sound.min.js".into());
        assert!(preload_scripts(&p).is_empty());
    }
}
