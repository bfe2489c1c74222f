//! # Application Context
//!
//! Owns everything the backend sets up once: file locations, the cached
//! settings and the cached API token.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. settings()                    config.yaml or environment            │
//! │  2. provision_certificate(ips)    only when useSSL                      │
//! │  3. token()                       .api_token                            │
//! │  4. write_frontend_settings()     webroot/settings/settings.json        │
//! │  5. database()                    dbMode → Database                     │
//! │  6. init_schema()                 tables + purchaseData view            │
//! │  7. health_check()                SELECT 1                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Paths are relative to the working directory, matching the deployment
//! layout where the backend runs one level below `config.yaml` and
//! `webroot/`.

use std::path::{Path, PathBuf};

use receipt_core::{FrontendSettings, Settings};
use receipt_db::Database;
use tracing::{info, warn};

use crate::config::ConfigLoader;
use crate::error::BootstrapResult;
use crate::frontend;
use crate::tls::{self, Provisioned};
use crate::token::TokenStore;

// =============================================================================
// Paths
// =============================================================================

/// File locations used during startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPaths {
    pub config_file: PathBuf,
    pub key_file: PathBuf,
    pub cert_file: PathBuf,
    pub token_file: PathBuf,
    pub frontend_settings: PathBuf,
}

impl Default for BootstrapPaths {
    fn default() -> Self {
        BootstrapPaths {
            config_file: PathBuf::from("../config.yaml"),
            key_file: PathBuf::from("../webroot/ssl/key.pem"),
            cert_file: PathBuf::from("../webroot/ssl/cert.crt"),
            token_file: PathBuf::from(".api_token"),
            frontend_settings: PathBuf::from("../webroot/settings/settings.json"),
        }
    }
}

impl BootstrapPaths {
    /// The default layout re-rooted under `base` (the backend's directory).
    pub fn rooted_at(base: &Path) -> Self {
        let defaults = BootstrapPaths::default();
        BootstrapPaths {
            config_file: base.join(defaults.config_file),
            key_file: base.join(defaults.key_file),
            cert_file: base.join(defaults.cert_file),
            token_file: base.join(defaults.token_file),
            frontend_settings: base.join(defaults.frontend_settings),
        }
    }
}

// =============================================================================
// Context
// =============================================================================

#[derive(Debug)]
pub struct AppContext {
    paths: BootstrapPaths,
    config: ConfigLoader,
    tokens: TokenStore,
}

impl AppContext {
    /// Context reading the process environment.
    pub fn new(paths: BootstrapPaths) -> Self {
        let config = ConfigLoader::new(paths.config_file.clone());
        AppContext::with_config(paths, config)
    }

    /// Context with a caller-built [`ConfigLoader`].
    pub fn with_config(paths: BootstrapPaths, config: ConfigLoader) -> Self {
        let tokens = TokenStore::new(paths.token_file.clone());
        AppContext {
            paths,
            config,
            tokens,
        }
    }

    pub fn paths(&self) -> &BootstrapPaths {
        &self.paths
    }

    pub fn settings(&self) -> BootstrapResult<&Settings> {
        Ok(self.config.load()?)
    }

    pub fn token(&self) -> BootstrapResult<&str> {
        self.tokens.ensure_token()
    }

    /// Creates the certificate pair for `backendHostname` plus `ips`.
    pub fn provision_certificate(&self, ips: &[String]) -> BootstrapResult<Provisioned> {
        let settings = self.settings()?;
        tls::provision_certificate(
            &settings.backend_hostname,
            ips,
            &self.paths.key_file,
            &self.paths.cert_file,
        )
    }

    pub fn write_frontend_settings(&self) -> BootstrapResult<FrontendSettings> {
        let settings = self.settings()?;
        let token = self.token()?;
        frontend::write_frontend_settings(&self.paths.frontend_settings, settings, token)
    }

    /// Builds the database handle. Does not connect.
    pub fn database(&self) -> BootstrapResult<Database> {
        Ok(Database::from_settings(self.settings()?)?)
    }

    /// Runs the whole startup sequence and returns the ready database.
    ///
    /// An unhealthy database after schema creation is logged, not fatal;
    /// requests surface their own connection errors.
    pub async fn bootstrap(&self) -> BootstrapResult<Database> {
        let settings = self.settings()?;

        if settings.use_ssl {
            let ips = certificate_addresses(settings);
            self.provision_certificate(&ips)?;
        }

        self.token()?;
        self.write_frontend_settings()?;

        let db = self.database()?;
        db.init_schema().await?;

        if db.health_check().await {
            info!(mode = %db.mode(), "Database ready");
        } else {
            warn!(mode = %db.mode(), "Database did not answer the health check");
        }

        Ok(db)
    }
}

/// Extra certificate addresses derived from the settings.
fn certificate_addresses(settings: &Settings) -> Vec<String> {
    let ip = settings.backend_ip.trim();
    if ip.is_empty() {
        Vec::new()
    } else {
        vec![ip.to_string()]
    }
}
