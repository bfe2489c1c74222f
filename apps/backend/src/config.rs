//! # Configuration Loader
//!
//! Produces the [`Settings`] document every other component reads.
//!
//! ## Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Mode Selection                                       │
//! │                                                                         │
//! │  RUN_IN_DOCKER unset, empty, 0/false/no/off                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  File mode ──► ../config.yaml (YAML mapping, unknown keys ignored)     │
//! │                                                                         │
//! │  RUN_IN_DOCKER set to anything else                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Environment mode ──► useSSL, backendHostname, ..., sqlPassword        │
//! │                       (unset variables read as "")                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```yaml
//! useSSL: true
//! backendHostname: receipts.local
//! backendIP: 192.168.1.20
//! backendPort: 5558
//! backendLanguage: en
//! dbMode: mysql
//! sqlServerIP: 192.168.1.30
//! sqlDatabase: receipts
//! sqlUsername: receipts
//! sqlPassword: secret
//! ```
//!
//! ## Caching
//! A [`ConfigLoader`] reads once. Later calls return the same document even
//! if the file or the environment changed in between.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use receipt_core::Settings;
use tracing::{debug, info};

use crate::error::ConfigError;

/// Environment variable selecting environment mode.
pub const RUN_IN_DOCKER: &str = "RUN_IN_DOCKER";

// =============================================================================
// Run Mode
// =============================================================================

/// Where settings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// YAML file on disk.
    File,
    /// Process environment (container deployments).
    Environment,
}

impl RunMode {
    /// Reads [`RUN_IN_DOCKER`] through `lookup`.
    pub fn detect(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        RunMode::from_flag(lookup(RUN_IN_DOCKER).as_deref())
    }

    /// `Environment` for any non-empty value except `0`, `false`, `no`, `off`.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            None | Some("") => RunMode::File,
            Some(raw) if is_negative(raw) => RunMode::File,
            Some(_) => RunMode::Environment,
        }
    }
}

fn is_negative(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::File => write!(f, "file"),
            RunMode::Environment => write!(f, "environment"),
        }
    }
}

// =============================================================================
// Loader
// =============================================================================

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Loads settings once and caches them.
///
/// ## Usage
/// ```rust,ignore
/// let loader = ConfigLoader::new("../config.yaml");
/// let settings = loader.load()?;
/// assert!(std::ptr::eq(settings, loader.load()?));
/// ```
pub struct ConfigLoader {
    path: PathBuf,
    lookup: Lookup,
    settings: OnceLock<Settings>,
}

impl ConfigLoader {
    /// Loader reading the real process environment.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigLoader::with_env(path, |key| std::env::var(key).ok())
    }

    /// Loader reading variables through `lookup` instead of the process
    /// environment.
    pub fn with_env<F>(path: impl Into<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        ConfigLoader {
            path: path.into(),
            lookup: Box::new(lookup),
            settings: OnceLock::new(),
        }
    }

    /// Path read in file mode.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the settings, reading them on first use.
    ///
    /// ## Errors
    /// File mode only: `Read` when the file can't be opened, `Parse` when it
    /// isn't a YAML mapping of settings. A failed load isn't cached.
    pub fn load(&self) -> Result<&Settings, ConfigError> {
        if let Some(settings) = self.settings.get() {
            return Ok(settings);
        }

        let settings = self.read()?;
        Ok(self.settings.get_or_init(|| settings))
    }

    fn read(&self) -> Result<Settings, ConfigError> {
        let mode = RunMode::detect(&*self.lookup);
        info!(mode = %mode, "Loading configuration");

        let settings = match mode {
            RunMode::File => read_settings_file(&self.path)?,
            RunMode::Environment => Settings::from_lookup(|key| (self.lookup)(key)),
        };

        debug!(
            db_mode = %settings.db_mode,
            use_ssl = settings.use_ssl,
            "Configuration loaded"
        );
        Ok(settings)
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("path", &self.path)
            .field("settings", &self.settings.get())
            .finish_non_exhaustive()
    }
}

/// Parses a YAML settings document.
pub fn parse_settings(yaml: &str) -> Result<Settings, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// Reads and parses the settings file at `path`.
pub fn read_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    info!(path = %path.display(), "Reading settings file");

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_settings(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
