//! Configuration types for `StructureConfig.json`.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::transform::OverrideTable;

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Struct and union roots to emit.
    #[serde(default)]
    pub structs: Vec<String>,
    /// Enum roots to emit. Resolved before `structs`.
    #[serde(default)]
    pub enums: Vec<String>,
    /// Root of the project that consumes the generated headers.
    pub charon_directory: PathBuf,
    /// The Ghidra data type dump.
    pub ghidra_file: PathBuf,
    /// Collapse runs of `field_*` placeholders into arrays.
    #[serde(default = "default_compress")]
    pub compress_file: bool,
    /// `struct → field → type` replacements applied before compression.
    #[serde(default)]
    pub override_types: OverrideTable,
    /// Namespace wrapping every generated header.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Source scanned for out-of-line method definitions.
    /// Defaults to `<charonDirectory>/framework/ghidra.extensions.cpp`.
    #[serde(default)]
    pub methods_file: Option<PathBuf>,
    /// Header scanned for subclass declarations.
    /// Defaults to `<charonDirectory>/framework/ghidra.extensions.h`.
    #[serde(default)]
    pub extensions_file: Option<PathBuf>,
    /// Where the headers are written. Defaults to `<charonDirectory>/headers`.
    #[serde(default)]
    pub header_directory: Option<PathBuf>,
}

fn default_compress() -> bool {
    true
}

fn default_namespace() -> String {
    "Ghidra".to_string()
}

/// File name of the main header.
pub const MAIN_HEADER: &str = "ghidra.h";
/// File name of the forward-declaration header.
pub const FORWARD_HEADER: &str = "ghidra.naked.h";
/// File name of the enum header.
pub const ENUMS_HEADER: &str = "ghidra.enums.h";

impl Config {
    /// Root type names in resolution order: enums first, then structs.
    pub fn roots(&self) -> Vec<&str> {
        self.enums
            .iter()
            .chain(&self.structs)
            .map(String::as_str)
            .collect()
    }

    pub fn charon_dir(&self, base_dir: &Path) -> PathBuf {
        resolve_path(&self.charon_directory, base_dir)
    }

    pub fn dump_path(&self, base_dir: &Path) -> PathBuf {
        resolve_path(&self.ghidra_file, base_dir)
    }

    pub fn methods_path(&self, base_dir: &Path) -> PathBuf {
        match &self.methods_file {
            Some(p) => resolve_path(p, base_dir),
            None => self
                .charon_dir(base_dir)
                .join("framework/ghidra.extensions.cpp"),
        }
    }

    pub fn extensions_path(&self, base_dir: &Path) -> PathBuf {
        match &self.extensions_file {
            Some(p) => resolve_path(p, base_dir),
            None => self.charon_dir(base_dir).join("framework/ghidra.extensions.h"),
        }
    }

    pub fn header_dir(&self, base_dir: &Path) -> PathBuf {
        match &self.header_directory {
            Some(p) => resolve_path(p, base_dir),
            None => self.charon_dir(base_dir).join("headers"),
        }
    }

    /// Every input file whose change should trigger a rerun.
    pub fn input_paths(&self, base_dir: &Path) -> Vec<PathBuf> {
        vec![
            self.dump_path(base_dir),
            self.methods_path(base_dir),
            self.extensions_path(base_dir),
        ]
    }
}

/// Resolve `path` against `base_dir` unless it is already absolute.
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Parse a configuration document.
pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    serde_json::from_str(content).map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))
}

/// Load and parse a `StructureConfig.json` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    parse_config(&content).with_context(|| format!("config file {}", path.display()))
}
