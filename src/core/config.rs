use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::core::engine::RunOptions;
use crate::core::graph::{validate_endpoint, Endpoints, DEFAULT_BASE_URL};
use crate::core::report::index::ReportColumns;
use crate::core::report::parser::ReportParser;

pub const REPORT_PERIODS: &[&str] = &["D7", "D30", "D90", "D180"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_format() -> String {
    "text".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            color: default_color(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default = "default_authority")]
    pub authority: String,
}

fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            authority: default_authority(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_period")]
    pub report_period: String,
    /// Cap on concurrent per-user detail fetches; unset or 0 means no cap
    pub max_concurrency: Option<usize>,
    /// Per-request timeout; unset means requests never time out
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_period() -> String {
    "D7".to_string()
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            report_period: default_period(),
            max_concurrency: None,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_key_column")]
    pub key_column: String,
    #[serde(default = "default_storage_column")]
    pub storage_used_column: String,
    #[serde(default = "default_quota_column")]
    pub quota_column: String,
    #[serde(default = "default_refreshed_column")]
    pub refreshed_at_column: String,
}

fn default_delimiter() -> String {
    ",".to_string()
}
fn default_key_column() -> String {
    ReportColumns::default().key
}
fn default_storage_column() -> String {
    ReportColumns::default().storage_used
}
fn default_quota_column() -> String {
    ReportColumns::default().quota
}
fn default_refreshed_column() -> String {
    ReportColumns::default().refreshed_at
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            key_column: default_key_column(),
            storage_used_column: default_storage_column(),
            quota_column: default_quota_column(),
            refreshed_at_column: default_refreshed_column(),
        }
    }
}

impl ReportSettings {
    fn delimiter_char(&self) -> Option<char> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub graph: GraphSettings,
    #[serde(default)]
    pub report: ReportSettings,
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("mbu").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found.
    /// Credentials from the environment take precedence over the file.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let overrides = [
            ("MBU_TENANT_ID", &mut self.auth.tenant_id),
            ("MBU_CLIENT_ID", &mut self.auth.client_id),
            ("MBU_CLIENT_SECRET", &mut self.auth.client_secret),
        ];
        for (name, slot) in overrides {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        }
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !["text", "json"].contains(&self.settings.default_format.as_str()) {
            issues.push(format!(
                "Invalid default_format: '{}' (must be 'text' or 'json')",
                self.settings.default_format
            ));
        }
        if !["auto", "always", "never"].contains(&self.settings.color.as_str()) {
            issues.push(format!(
                "Invalid color: '{}' (must be 'auto', 'always', or 'never')",
                self.settings.color
            ));
        }
        if let Err(e) = validate_endpoint(&self.graph.base_url, "graph.base_url") {
            issues.push(e.to_string());
        }
        if let Err(e) = validate_endpoint(&self.auth.authority, "auth.authority") {
            issues.push(e.to_string());
        }
        if !REPORT_PERIODS.contains(&self.graph.report_period.as_str()) {
            issues.push(format!(
                "Invalid report_period: '{}' (must be one of {})",
                self.graph.report_period,
                REPORT_PERIODS.join(", ")
            ));
        }
        if self.report.delimiter_char().is_none() {
            issues.push(format!(
                "Invalid delimiter: '{}' (must be a single character)",
                self.report.delimiter
            ));
        }
        issues
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.graph
            .request_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            endpoints: Endpoints::new(&self.graph.base_url, &self.graph.report_period),
            parser: ReportParser::new(self.report.delimiter_char().unwrap_or(',')),
            columns: ReportColumns {
                key: self.report.key_column.clone(),
                storage_used: self.report.storage_used_column.clone(),
                quota: self.report.quota_column.clone(),
                refreshed_at: self.report.refreshed_at_column.clone(),
            },
            max_concurrency: self.graph.max_concurrency.filter(|n| *n > 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let issues = config.validate();
        assert!(issues.is_empty(), "Default config should be valid, got: {:?}", issues);
    }

    #[test]
    fn defaults_match_graph() {
        let config = AppConfig::default();
        assert_eq!(config.settings.default_format, "text");
        assert_eq!(config.graph.base_url, "https://graph.microsoft.com/v1.0");
        assert_eq!(config.graph.report_period, "D7");
        assert_eq!(config.report.key_column, "User Principal Name");
        assert!(config.graph.max_concurrency.is_none());
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn validate_catches_invalid_format() {
        let mut config = AppConfig::default();
        config.settings.default_format = "xml".to_string();
        assert!(config.validate().iter().any(|i| i.contains("default_format")));
    }

    #[test]
    fn validate_catches_insecure_base_url() {
        let mut config = AppConfig::default();
        config.graph.base_url = "http://graph.microsoft.com/v1.0".to_string();
        assert!(config.validate().iter().any(|i| i.contains("must use HTTPS")));
    }

    #[test]
    fn validate_catches_invalid_period() {
        let mut config = AppConfig::default();
        config.graph.report_period = "D14".to_string();
        assert!(config.validate().iter().any(|i| i.contains("report_period")));
    }

    #[test]
    fn validate_catches_multi_char_delimiter() {
        let mut config = AppConfig::default();
        config.report.delimiter = ",,".to_string();
        assert!(config.validate().iter().any(|i| i.contains("delimiter")));
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[graph]
report_period = "D30"
max_concurrency = 8
request_timeout_secs = 20

[report]
delimiter = ";"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.graph.report_period, "D30");
        assert_eq!(config.graph.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(20)));

        let options = config.run_options();
        assert_eq!(options.max_concurrency, Some(8));
        assert!(options.endpoints.usage_report().contains("period='D30'"));
        assert_eq!(options.columns, ReportColumns::default());
    }

    #[test]
    fn zero_concurrency_means_unbounded() {
        let mut config = AppConfig::default();
        config.graph.max_concurrency = Some(0);
        assert!(config.run_options().max_concurrency.is_none());
    }

    #[test]
    fn parse_empty_toml_gives_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.settings.color, "auto");
        assert_eq!(config.auth.authority, "https://login.microsoftonline.com");
    }

    #[test]
    fn env_overrides_file_credentials() {
        let mut config: AppConfig = toml::from_str(
            r#"
[auth]
tenant_id = "from-file"
client_id = "file-client"
"#,
        )
        .unwrap();
        config.apply_env(|name| match name {
            "MBU_TENANT_ID" => Some("from-env".into()),
            "MBU_CLIENT_SECRET" => Some("s3cret".into()),
            "MBU_CLIENT_ID" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.auth.tenant_id.as_deref(), Some("from-env"));
        assert_eq!(config.auth.client_id.as_deref(), Some("file-client"));
        assert_eq!(config.auth.client_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn config_path_uses_xdg_when_set() {
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/test_xdg_config");
        let path = AppConfig::config_path();
        std::env::remove_var("XDG_CONFIG_HOME");
        assert_eq!(path, PathBuf::from("/tmp/test_xdg_config/mbu/config.toml"));
    }
}
