use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use strive_build::build::{self, BuildReport, Project};
use strive_build::error::SketchError;
use strive_build::manifest::Profile;
use strive_build::serve::{self, ServeConfig};
use strive_build::shim::emit;
use strive_build::sketch;

#[derive(Parser)]
#[command(name = "strive", version)]
#[command(about = "Bundle p5, Skulpt and the Strive shim into one distributable script")]
struct Cli {
    /// With no subcommand, every built-in profile is built from the current directory.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Target {
    /// Build only this profile
    #[arg(long)]
    profile: Option<String>,

    /// Project root; manifest paths are relative to it
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Output directory (default: <root>/dist)
    #[arg(long)]
    out: Option<PathBuf>,

    /// JSON file holding an array of profiles, replacing the built-in ones
    #[arg(long)]
    profiles: Option<PathBuf>,
}

impl Target {
    fn project(&self) -> Project {
        let project = Project::new(&self.root);
        match &self.out {
            Some(out) => project.with_out_dir(out),
            None => project,
        }
    }

    fn resolve(&self) -> anyhow::Result<Vec<Profile>> {
        strive_build::resolve_profiles(self.profiles.as_deref(), self.profile.as_deref())
            .context("cannot resolve build profiles")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Concatenate the manifest and copy assets
    Build {
        #[command(flatten)]
        target: Target,

        /// Print build reports as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// List profiles and their manifests
    Profiles {
        /// JSON file holding an array of profiles
        #[arg(long)]
        profiles: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Print the generated integration shim
    Shim {
        /// Write to file instead of stdout
        #[arg(short)]
        o: Option<PathBuf>,
    },

    /// Check a Python sketch against the shim
    Check {
        /// Sketch file
        file: PathBuf,

        /// Treat unknown calls as errors
        #[arg(long)]
        strict: bool,
    },

    /// Rebuild whenever an input changes
    Watch {
        #[command(flatten)]
        target: Target,
    },

    /// Build, then serve the output with a page that runs a sketch
    Serve {
        #[command(flatten)]
        target: Target,

        /// Server port
        #[arg(long, default_value_t = 3333)]
        port: u16,

        /// Sketch served at /sketch.py
        #[arg(long)]
        sketch: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Option<Commands>) -> anyhow::Result<()> {
    match command {
        None => {
            let reports = strive_build::build_default(Path::new("."))?;
            report(&reports);
        }

        Some(Commands::Build { target, json }) => {
            let profiles = target.resolve()?;
            let reports = build::build_all(&target.project(), &profiles)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                report(&reports);
            }
        }

        Some(Commands::Profiles { profiles, json }) => {
            let profiles = strive_build::resolve_profiles(profiles.as_deref(), None)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else {
                for p in &profiles {
                    println!("{} -> {}", p.name, p.output);
                    for entry in &p.manifest {
                        println!("  {}", entry.label());
                    }
                    for asset in &p.assets {
                        println!("  + {asset}");
                    }
                }
            }
        }

        Some(Commands::Shim { o }) => {
            let js = emit::render_shim();
            match o {
                Some(path) => {
                    fs::write(&path, &js)
                        .with_context(|| format!("cannot write '{}'", path.display()))?;
                    eprintln!("wrote shim to {} ({} bytes)", path.display(), js.len());
                }
                None => print!("{js}"),
            }
        }

        Some(Commands::Check { file, strict }) => {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("cannot read '{}'", file.display()))?;

            let (analysis, diags) = match strive_build::check_sketch(&source, strict) {
                Ok(r) => r,
                Err(e) => {
                    print_error(&e, &source);
                    process::exit(1);
                }
            };

            for d in &diags {
                eprintln!("{d}");
            }
            let handlers = analysis.handlers();
            if !handlers.is_empty() {
                eprintln!("{}: handlers: {}", file.display(), handlers.join(", "));
            }
            if sketch::has_errors(&diags) {
                bail!("{} does not satisfy the sketch contract", file.display());
            }
            if diags.is_empty() {
                eprintln!("{}: ok", file.display());
            } else {
                eprintln!("{}: {} warning(s)", file.display(), diags.len());
            }
        }

        Some(Commands::Watch { target }) => {
            let profiles = target.resolve()?;
            let project = target.project();
            eprintln!("watching {} for changes...", project.root.display());
            strive_build::watch::watch(&project, &profiles, |result| {
                match result {
                    Ok(reports) => report(&reports),
                    Err(e) => eprintln!("error: {e}"),
                }
                ControlFlow::Continue(())
            })?;
        }

        Some(Commands::Serve {
            target,
            port,
            sketch,
        }) => {
            let profiles = target.resolve()?;
            let project = target.project();
            let reports = build::build_all(&project, &profiles)?;
            report(&reports);

            let Some(profile) = profiles.first() else {
                bail!("no profile to serve");
            };
            let config = ServeConfig {
                port,
                out_dir: project.out_dir.clone(),
                artifact: profile.output.clone(),
                preload: serve::preload_scripts(profile),
                sketch,
            };
            serve::serve(&config)?;
        }
    }

    Ok(())
}

fn report(reports: &[BuildReport]) {
    for r in reports {
        eprintln!("wrote {} ({} bytes)", r.output.display(), r.bytes);
        for a in &r.assets {
            eprintln!("  copied {} ({} bytes)", a.name, a.bytes);
        }
    }
}

fn print_error(e: &SketchError, source: &str) {
    eprintln!("error: {e}");

    if let Some(span) = &e.span {
        if span.start <= source.len() {
            let line_num = source[..span.start].chars().filter(|c| *c == '\n').count() + 1;
            let line_start = source[..span.start].rfind('\n').map(|i| i + 1).unwrap_or(0);
            let line_end = source[span.start..]
                .find('\n')
                .map(|i| span.start + i)
                .unwrap_or(source.len());
            let line = &source[line_start..line_end];
            let col = span.start - line_start;

            eprintln!();
            eprintln!("  {line_num} | {line}");
            eprintln!(
                "  {} | {}^",
                " ".repeat(line_num.to_string().len()),
                " ".repeat(col)
            );
        }
    }
}
