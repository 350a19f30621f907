//! Application configuration.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the working directory. Unset or unparsable values fall back to
//! the defaults below.

use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8090;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DATABASE: &str = "mysql";
const DEFAULT_REGISTRY_PATH: &str = "studio-registry.json";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Runtime configuration shared by the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name, used in logs and response metadata.
    pub service_name: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Timeout for opening a database session.
    pub connect_timeout_secs: u64,
    /// Database name used when neither the driver options nor the
    /// connection URI name one.
    pub default_database: String,
    /// File backing the connection registry.
    pub registry_path: PathBuf,
    /// Log output format.
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load_with_service(service_name: &str) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            service_name: service_name.to_string(),
            host: non_empty("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: non_empty("SERVER_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            connect_timeout_secs: non_empty("DB_CONNECT_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            default_database: non_empty("STUDIO_DEFAULT_DATABASE")
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            registry_path: non_empty("STUDIO_REGISTRY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY_PATH)),
            log_format: non_empty("LOG_FORMAT")
                .and_then(|v| LogFormat::parse(&v))
                .unwrap_or(LogFormat::Pretty),
        }
    }

    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loads a `.env` file from the working directory (best-effort, no error if
/// missing). Variables already present in the environment win.
pub fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    let Ok(content) = std::fs::read_to_string(env_path) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if std::env::var(&key).is_err() {
            std::env::set_var(key, value);
        }
    }
}

/// Parses `KEY=VALUE` lines, skipping blanks and `#` comments. Surrounding
/// quotes on the value are stripped.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup("studio-service", |_| None);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8090);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.default_database, "mysql");
        assert_eq!(config.registry_path, PathBuf::from("studio-registry.json"));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.bind_address(), "127.0.0.1:8090");
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = AppConfig::from_lookup(
            "studio-service",
            lookup_from(&[
                ("SERVER_HOST", "0.0.0.0"),
                ("SERVER_PORT", "9000"),
                ("DB_CONNECT_TIMEOUT_SECS", "3"),
                ("STUDIO_DEFAULT_DATABASE", "shop"),
                ("STUDIO_REGISTRY_PATH", "/tmp/registry.json"),
                ("LOG_FORMAT", "JSON"),
            ]),
        );
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.connect_timeout_secs, 3);
        assert_eq!(config.default_database, "shop");
        assert_eq!(config.registry_path, PathBuf::from("/tmp/registry.json"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(
            "studio-service",
            lookup_from(&[
                ("SERVER_PORT", "not-a-port"),
                ("DB_CONNECT_TIMEOUT_SECS", "0"),
                ("STUDIO_DEFAULT_DATABASE", "   "),
                ("LOG_FORMAT", "xml"),
            ]),
        );
        assert_eq!(config.port, 8090);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.default_database, "mysql");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_dotenv_skips_comments_and_strips_quotes() {
        let parsed = parse_dotenv("# comment\n\nSERVER_PORT=9001\nLOG_FORMAT=\"json\"\n=orphan\nnoequals\n");
        assert_eq!(
            parsed,
            vec![
                ("SERVER_PORT".to_string(), "9001".to_string()),
                ("LOG_FORMAT".to_string(), "json".to_string()),
            ]
        );
    }
}
