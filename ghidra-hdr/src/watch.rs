//! Polling trigger: rerun the pipeline whenever one of its inputs changes.
//!
//! Runs never overlap; each poll either does nothing or performs one full
//! run to completion. A config that fails to parse is reported and the
//! previous one stays active.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::{self, Config};

/// Outcome of a single [`Watcher::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// Nothing changed.
    Idle,
    /// The config changed but did not parse; nothing was run.
    ConfigRejected,
    /// An input changed and the headers were rewritten.
    Rebuilt,
    /// An input changed but the run failed; previous headers are untouched.
    Failed,
}

/// Tracks modification times of the config and every input it names.
pub struct Watcher {
    config_path: PathBuf,
    base_dir: PathBuf,
    output_dir: Option<PathBuf>,
    config: Config,
    stamps: HashMap<PathBuf, Option<SystemTime>>,
}

impl Watcher {
    /// Load the initial config. Failing to load it is fatal, since there is
    /// no previous config to fall back on.
    pub fn new(config_path: &Path, output_dir: Option<&Path>) -> Result<Self> {
        let config = config::load_config(config_path)
            .with_context(|| format!("loading config from {}", config_path.display()))?;
        let base_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let mut watcher = Self {
            config_path: config_path.to_path_buf(),
            base_dir,
            output_dir: output_dir.map(Path::to_path_buf),
            config,
            stamps: HashMap::new(),
        };
        let config_path = watcher.config_path.clone();
        watcher.changed(&config_path);
        watcher.inputs_changed();
        Ok(watcher)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline with the current config.
    pub fn run_once(&self) -> Result<Vec<PathBuf>> {
        crate::run_from_config(&self.config, &self.base_dir, self.output_dir.as_deref())
    }

    /// Check every watched file once and rerun if anything changed.
    pub fn poll(&mut self) -> Poll {
        let mut trigger = false;

        let config_path = self.config_path.clone();
        if self.changed(&config_path) {
            match config::load_config(&self.config_path) {
                Ok(config) => {
                    info!(path = %self.config_path.display(), "configuration reloaded");
                    self.config = config;
                    trigger = true;
                }
                Err(e) => {
                    error!(err = %format!("{e:#}"), "configuration rejected, keeping previous");
                    return Poll::ConfigRejected;
                }
            }
        }

        // Always refresh every stamp so a config switch picks up new paths.
        if self.inputs_changed() {
            trigger = true;
        }

        if !trigger {
            return Poll::Idle;
        }
        self.rebuild()
    }

    /// Initial run, then poll every `interval` forever.
    pub fn watch(mut self, interval: Duration) -> Result<()> {
        info!(
            config = %self.config_path.display(),
            interval_ms = interval.as_millis() as u64,
            "watching for changes"
        );
        self.rebuild();
        loop {
            std::thread::sleep(interval);
            self.poll();
        }
    }

    fn rebuild(&mut self) -> Poll {
        match self.run_once() {
            Ok(paths) => {
                info!(headers = paths.len(), "rebuilt headers");
                Poll::Rebuilt
            }
            Err(e) => {
                error!(err = %format!("{e:#}"), "run failed, previous headers left in place");
                Poll::Failed
            }
        }
    }

    fn inputs_changed(&mut self) -> bool {
        let mut any = false;
        for path in self.config.input_paths(&self.base_dir) {
            any |= self.changed(&path);
        }
        any
    }

    /// Record the current modification time of `path`; true if it differs
    /// from the last one seen (or the path is new).
    fn changed(&mut self, path: &Path) -> bool {
        let now = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        match self.stamps.insert(path.to_path_buf(), now) {
            Some(prev) => prev != now,
            None => true,
        }
    }
}
