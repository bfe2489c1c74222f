//! # Settings Document
//!
//! The single settings map every component reads from.
//!
//! ## Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RUN_IN_DOCKER unset          RUN_IN_DOCKER=1                           │
//! │        │                            │                                  │
//! │        ▼                            ▼                                  │
//! │  ../config.yaml              useSSL, backendHostname, ... (env)        │
//! │        │                            │                                  │
//! │        └────────────┬───────────────┘                                  │
//! │                     ▼                                                   │
//! │                 Settings                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both sources use the same camelCase keys. The YAML file is parsed by the
//! backend crate; [`Settings::from_lookup`] builds the environment variant
//! from any key lookup so it can be exercised without touching the process
//! environment.
//!
//! Scalars are read loosely: `useSSL` accepts `true`, `"true"`, `1`, `"yes"`,
//! and ports may be written as numbers or strings.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Keys read in environment mode, in the order they are documented.
pub const ENV_KEYS: [&str; 13] = [
    "useSSL",
    "backendHostname",
    "backendIP",
    "backendPort",
    "backendLanguage",
    "parserIP",
    "parserPort",
    "parserToken",
    "dbMode",
    "sqlServerIP",
    "sqlDatabase",
    "sqlUsername",
    "sqlPassword",
];

/// Loaded backend settings.
///
/// Missing keys become `false` / empty strings; nothing here is required.
/// Components that need a value check it themselves.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Serve the web UI over HTTPS (and provision a certificate).
    #[serde(rename = "useSSL", default, deserialize_with = "loose_bool")]
    pub use_ssl: bool,

    /// Certificate common name and first DNS SAN.
    #[serde(rename = "backendHostname", default, deserialize_with = "loose_string")]
    pub backend_hostname: String,

    #[serde(rename = "backendIP", default, deserialize_with = "loose_string")]
    pub backend_ip: String,

    #[serde(rename = "backendPort", default, deserialize_with = "loose_string")]
    pub backend_port: String,

    /// UI language code passed through to the front end.
    #[serde(rename = "backendLanguage", default, deserialize_with = "loose_string")]
    pub backend_language: String,

    /// Remote receipt parser.
    #[serde(rename = "parserIP", default, deserialize_with = "loose_string")]
    pub parser_ip: String,

    #[serde(rename = "parserPort", default, deserialize_with = "loose_string")]
    pub parser_port: String,

    #[serde(rename = "parserToken", default, deserialize_with = "loose_string")]
    pub parser_token: String,

    /// `"mysql"` or `"mssql"`. Kept raw; the database layer parses it.
    #[serde(rename = "dbMode", default, deserialize_with = "loose_string")]
    pub db_mode: String,

    /// Database host, optionally with port or instance.
    #[serde(rename = "sqlServerIP", default, deserialize_with = "loose_string")]
    pub sql_server_ip: String,

    #[serde(rename = "sqlDatabase", default, deserialize_with = "loose_string")]
    pub sql_database: String,

    #[serde(rename = "sqlUsername", default, deserialize_with = "loose_string")]
    pub sql_username: String,

    #[serde(rename = "sqlPassword", default, deserialize_with = "loose_string")]
    pub sql_password: String,
}

impl Settings {
    /// Builds settings from a key lookup, substituting `""` for absent keys.
    ///
    /// ## Example
    /// ```rust
    /// use receipt_core::Settings;
    ///
    /// let settings = Settings::from_lookup(|key| match key {
    ///     "dbMode" => Some("mysql".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(settings.db_mode, "mysql");
    /// assert_eq!(settings.sql_server_ip, "");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();

        Settings {
            use_ssl: lookup("useSSL").is_some_and(|raw| parse_flag(&raw)),
            backend_hostname: get("backendHostname"),
            backend_ip: get("backendIP"),
            backend_port: get("backendPort"),
            backend_language: get("backendLanguage"),
            parser_ip: get("parserIP"),
            parser_port: get("parserPort"),
            parser_token: get("parserToken"),
            db_mode: get("dbMode"),
            sql_server_ip: get("sqlServerIP"),
            sql_database: get("sqlDatabase"),
            sql_username: get("sqlUsername"),
            sql_password: get("sqlPassword"),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("use_ssl", &self.use_ssl)
            .field("backend_hostname", &self.backend_hostname)
            .field("backend_ip", &self.backend_ip)
            .field("backend_port", &self.backend_port)
            .field("backend_language", &self.backend_language)
            .field("parser_ip", &self.parser_ip)
            .field("parser_port", &self.parser_port)
            .field("parser_token", &redacted(&self.parser_token))
            .field("db_mode", &self.db_mode)
            .field("sql_server_ip", &self.sql_server_ip)
            .field("sql_database", &self.sql_database)
            .field("sql_username", &self.sql_username)
            .field("sql_password", &redacted(&self.sql_password))
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

/// Interprets a boolean-like string: `true`, `1`, `yes`, `on` (any case).
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

// =============================================================================
// Loose Scalar Deserializers
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => false,
        Some(Scalar::Bool(value)) => value,
        Some(Scalar::Int(value)) => value != 0,
        Some(Scalar::Float(value)) => value != 0.0,
        Some(Scalar::Text(value)) => parse_flag(&value),
    })
}

fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Bool(value)) => value.to_string(),
        Some(Scalar::Int(value)) => value.to_string(),
        Some(Scalar::Float(value)) => value.to_string(),
        Some(Scalar::Text(value)) => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup_defaults_to_empty() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
        assert!(!settings.use_ssl);
    }

    #[test]
    fn test_from_lookup_reads_every_key() {
        let env: HashMap<&str, String> = ENV_KEYS
            .iter()
            .map(|key| (*key, format!("v-{key}")))
            .collect();
        let settings = Settings::from_lookup(|key| env.get(key).cloned());

        assert_eq!(settings.backend_hostname, "v-backendHostname");
        assert_eq!(settings.parser_token, "v-parserToken");
        assert_eq!(settings.sql_password, "v-sqlPassword");
        // "v-useSSL" is not boolean-like
        assert!(!settings.use_ssl);
    }

    #[test]
    fn test_use_ssl_flag_values() {
        for raw in ["true", "TRUE", "1", "yes", " on "] {
            let settings = Settings::from_lookup(|key| (key == "useSSL").then(|| raw.to_string()));
            assert!(settings.use_ssl, "{raw} should enable SSL");
        }
        for raw in ["", "false", "0", "no"] {
            let settings = Settings::from_lookup(|key| (key == "useSSL").then(|| raw.to_string()));
            assert!(!settings.use_ssl, "{raw} should not enable SSL");
        }
    }

    #[test]
    fn test_loose_scalars() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "useSSL": 1,
            "backendPort": 5558,
            "dbMode": "mysql",
            "sqlPassword": null,
            "somethingElse": "ignored"
        }))
        .unwrap();

        assert!(settings.use_ssl);
        assert_eq!(settings.backend_port, "5558");
        assert_eq!(settings.db_mode, "mysql");
        assert_eq!(settings.sql_password, "");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = Settings {
            sql_password: "hunter2".to_string(),
            parser_token: "tok".to_string(),
            ..Settings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("\"tok\""));
        assert!(debug.contains("<redacted>"));
    }
}
