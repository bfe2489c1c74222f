//! Writes `settings.json` for the web front end.
//!
//! ```json
//! {"useSSL":true,"backendIP":"192.168.1.20","backendPort":"5558","backendToken":"3f2a9c1e","language":"en"}
//! ```

use std::fs;
use std::path::Path;

use receipt_core::{FrontendSettings, Settings};
use tracing::info;

use crate::error::{BootstrapError, BootstrapResult};

/// Writes the front-end settings file, replacing any previous one.
pub fn write_frontend_settings(
    path: &Path,
    settings: &Settings,
    token: &str,
) -> BootstrapResult<FrontendSettings> {
    let frontend = FrontendSettings::new(settings, token);
    let json = serde_json::to_string(&frontend)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BootstrapError::io(parent, e))?;
    }
    fs::write(path, json).map_err(|e| BootstrapError::io(path, e))?;

    info!(path = %path.display(), "Front-end settings written");
    Ok(frontend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_expected_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings/settings.json");
        let settings = Settings {
            use_ssl: true,
            backend_ip: "192.168.1.20".to_string(),
            backend_port: "5558".to_string(),
            backend_language: "de".to_string(),
            sql_password: "secret".to_string(),
            ..Settings::default()
        };

        write_frontend_settings(&path, &settings, "abcd1234").unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!({
                "useSSL": true,
                "backendIP": "192.168.1.20",
                "backendPort": "5558",
                "backendToken": "abcd1234",
                "language": "de"
            })
        );
    }

    #[test]
    fn test_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "stale").unwrap();

        let frontend = write_frontend_settings(&path, &Settings::default(), "t0k3n000").unwrap();

        assert_eq!(frontend.backend_token, "t0k3n000");
        assert!(fs::read_to_string(&path).unwrap().contains("t0k3n000"));
    }
}
