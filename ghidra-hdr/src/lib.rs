//! ghidra-hdr: Ghidra data type dump → C++ headers.
//!
//! Parses the C declarations Ghidra exports, resolves the dependency closure
//! of a configured set of root types, and renders three headers: forward
//! declarations, enums, and full struct/union bodies with hand-written
//! methods attached.
//!
//! # Quick start
//!
//! Generate and write the headers from a config:
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads StructureConfig.json, parses the dump, writes the three headers.
//! ghidra_hdr::run(Path::new("StructureConfig.json"), None).unwrap();
//! ```
//!
//! Or get the header text without writing to disk:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let artifacts = ghidra_hdr::generate(Path::new("StructureConfig.json")).unwrap();
//! println!("{}", artifacts.main);
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tempfile::NamedTempFile;
use tracing::{info, warn};

pub mod augment;
pub mod config;
pub mod emit;
pub mod model;
pub mod parse;
pub mod resolve;
pub mod transform;
pub mod watch;

pub use emit::Artifacts;

/// Text of the hand-written sources scanned for augmentation records.
/// `None` means the file was not available.
#[derive(Debug, Default, Clone)]
pub struct AugmentSources {
    pub methods: Option<String>,
    pub extensions: Option<String>,
}

/// Run the full pipeline: load config, parse the dump, render, and write the
/// three headers.
///
/// `config_path` is the path to a `StructureConfig.json` file.
/// `output_dir` optionally overrides the header directory from the config.
///
/// Returns the paths written.
pub fn run(config_path: &Path, output_dir: Option<&Path>) -> Result<Vec<PathBuf>> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    run_from_config(&cfg, base_dir, output_dir)
}

/// Like [`run`], with an already-loaded [`config::Config`].
///
/// Nothing is written unless every header rendered successfully.
pub fn run_from_config(
    cfg: &config::Config,
    base_dir: &Path,
    output_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let artifacts = generate_from_config(cfg, base_dir)?;

    let dir = match output_dir {
        Some(p) => p.to_path_buf(),
        None => cfg.header_dir(base_dir),
    };
    write_artifacts(&artifacts, &dir)
}

/// Parse a `StructureConfig.json` config file and return the rendered headers
/// without writing to disk.
pub fn generate(config_path: &Path) -> Result<Artifacts> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    generate_from_config(&cfg, base_dir)
}

/// Read the dump and augmentation sources named by `cfg` and render the
/// headers.
///
/// `base_dir` is the directory relative to which paths in the config are
/// resolved (typically the parent directory of the JSON file).
pub fn generate_from_config(cfg: &config::Config, base_dir: &Path) -> Result<Artifacts> {
    info!(
        structs = cfg.structs.len(),
        enums = cfg.enums.len(),
        compress = cfg.compress_file,
        "loaded configuration"
    );

    let dump_path = cfg.dump_path(base_dir);
    let dump = std::fs::read(&dump_path)
        .with_context(|| format!("reading dump {}", dump_path.display()))?;
    let dump = String::from_utf8_lossy(&dump);

    let sources = AugmentSources {
        methods: augment::read_source(&cfg.methods_path(base_dir)),
        extensions: augment::read_source(&cfg.extensions_path(base_dir)),
    };

    generate_headers(&dump, &sources, cfg)
}

/// The pipeline proper: parse → resolve → transform → emit.
///
/// Pure function of its inputs; a fresh registry is built on every call.
pub fn generate_headers(dump: &str, sources: &AugmentSources, cfg: &config::Config) -> Result<Artifacts> {
    let mut registry = parse::parse_dump(dump).context("parsing data type dump")?;
    if registry.is_empty() {
        warn!("dump declares no types");
    }
    info!(types = registry.len(), "parsed dump");

    let methods = sources
        .methods
        .as_deref()
        .map(augment::scan_methods)
        .unwrap_or_default();
    let children = sources
        .extensions
        .as_deref()
        .map(augment::scan_children)
        .unwrap_or_default();
    let augmentation = augment::Augmentation::new(&registry, methods, children);

    let closure = resolve::resolve(&registry, &cfg.roots());
    info!(
        resolved = closure.resolved().count(),
        missing = closure.missing().count(),
        "created dependency chain"
    );

    transform::apply(
        &mut registry,
        &closure,
        &cfg.override_types,
        cfg.compress_file,
    );

    let options = emit::EmitOptions {
        namespace: cfg.namespace.clone(),
        forward_file: config::FORWARD_HEADER.to_string(),
        enums_file: config::ENUMS_HEADER.to_string(),
    };
    Ok(emit::emit_headers(&registry, &closure, &augmentation, &options))
}

/// Write the three headers into `dir`, creating it if needed.
///
/// Every header is first written to a temporary file in `dir`. The targets
/// are renamed over only once all three are staged, so a failed write
/// leaves the previous headers in place.
pub fn write_artifacts(artifacts: &Artifacts, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating header directory {}", dir.display()))?;

    let mut staged = Vec::new();
    for (name, text) in [
        (config::MAIN_HEADER, &artifacts.main),
        (config::FORWARD_HEADER, &artifacts.forward),
        (config::ENUMS_HEADER, &artifacts.enums),
    ] {
        let path = dir.join(name);
        let existing = std::fs::metadata(&path).ok();
        if existing.as_ref().is_some_and(|m| m.is_dir()) {
            bail!("header path {} is a directory", path.display());
        }

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temporary file in {}", dir.display()))?;
        tmp.write_all(text.as_bytes())
            .with_context(|| format!("staging header {}", path.display()))?;
        if let Some(meta) = existing {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .with_context(|| format!("copying permissions of {}", path.display()))?;
        }
        staged.push((tmp, path, text.len()));
    }

    let mut written = Vec::new();
    for (tmp, path, size) in staged {
        tmp.persist(&path)
            .with_context(|| format!("writing header {}", path.display()))?;
        info!(path = %path.display(), size, "wrote header");
        written.push(path);
    }
    Ok(written)
}
