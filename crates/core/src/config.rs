use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CURRENT_TFM: &str = "net9.0";
const DEFAULT_LTS_TFM: &str = "net8.0";
const DEFAULT_PREVIEW_TFM: &str = "net10.0";
const DEFAULT_WINDOWS_SDK_VERSION: &str = "10.0.19041.0";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PACKAGE_SOURCE: &str = "https://api.nuget.org/v3-flatcontainer/";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Which release channel the selector upgrades applications to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TfmSupport {
    Current,
    Lts,
    Preview,
}

impl TfmSupport {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "current" | "sts" => Some(TfmSupport::Current),
            "lts" => Some(TfmSupport::Lts),
            "preview" => Some(TfmSupport::Preview),
            _ => None,
        }
    }
}

impl fmt::Display for TfmSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TfmSupport::Current => write!(f, "current"),
            TfmSupport::Lts => write!(f, "lts"),
            TfmSupport::Preview => write!(f, "preview"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TFM support level: {0}. Valid options: current, lts, preview")]
    InvalidTfmSupport(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone)]
pub struct DotportConfig {
    pub tfm_support: TfmSupport,
    pub current_tfm_base: String,
    pub lts_tfm_base: String,
    pub preview_tfm_base: String,
    pub windows_sdk_version: String,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub package_sources: Vec<String>,
    pub log_level: String,
}

impl Default for DotportConfig {
    fn default() -> Self {
        Self {
            tfm_support: TfmSupport::Lts,
            current_tfm_base: DEFAULT_CURRENT_TFM.to_string(),
            lts_tfm_base: DEFAULT_LTS_TFM.to_string(),
            preview_tfm_base: DEFAULT_PREVIEW_TFM.to_string(),
            windows_sdk_version: DEFAULT_WINDOWS_SDK_VERSION.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            package_sources: vec![DEFAULT_PACKAGE_SOURCE.to_string()],
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl DotportConfig {
    /// Defaults overridden by `DOTPORT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = env::var("DOTPORT_TFM_SUPPORT") {
            config.tfm_support =
                TfmSupport::parse(&value).ok_or(ConfigError::InvalidTfmSupport(value))?;
        }

        if let Ok(value) = env::var("DOTPORT_CURRENT_TFM") {
            config.current_tfm_base = value;
        }
        if let Ok(value) = env::var("DOTPORT_LTS_TFM") {
            config.lts_tfm_base = value;
        }
        if let Ok(value) = env::var("DOTPORT_PREVIEW_TFM") {
            config.preview_tfm_base = value;
        }
        if let Ok(value) = env::var("DOTPORT_WINDOWS_SDK_VERSION") {
            config.windows_sdk_version = value;
        }

        config.max_retries = parse_env("DOTPORT_MAX_RETRIES", config.max_retries)?;
        config.retry_base_delay_ms =
            parse_env("DOTPORT_RETRY_BASE_DELAY_MS", config.retry_base_delay_ms)?;
        config.request_timeout_secs =
            parse_env("DOTPORT_REQUEST_TIMEOUT", config.request_timeout_secs)?;

        if let Ok(value) = env::var("DOTPORT_PACKAGE_SOURCES") {
            config.package_sources = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.log_level = env::var("DOTPORT_LOG_LEVEL")
            .unwrap_or(config.log_level)
            .to_lowercase();

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max retries must be at least 1".to_string(),
            ));
        }
        if self.max_retries > 10 {
            return Err(ConfigError::ValidationFailed(
                "Max retries cannot exceed 10".to_string(),
            ));
        }

        if self.retry_base_delay_ms == 0 || self.retry_base_delay_ms > 60_000 {
            return Err(ConfigError::ValidationFailed(
                "Retry base delay must be between 1ms and 60s".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 3600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 1 hour".to_string(),
            ));
        }

        if self.package_sources.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "At least one package source is required".to_string(),
            ));
        }

        for (field, value) in [
            ("current_tfm_base", &self.current_tfm_base),
            ("lts_tfm_base", &self.lts_tfm_base),
            ("preview_tfm_base", &self.preview_tfm_base),
        ] {
            if !looks_like_net_tfm(value) {
                return Err(ConfigError::ParseError {
                    field: field.to_string(),
                    error: format!("'{}' is not a .NET target framework such as net8.0", value),
                });
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// The application TFM base for the configured support level.
    pub fn app_tfm_base(&self) -> &str {
        match self.tfm_support {
            TfmSupport::Current => &self.current_tfm_base,
            TfmSupport::Lts => &self.lts_tfm_base,
            TfmSupport::Preview => &self.preview_tfm_base,
        }
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("tfm_support".to_string(), self.tfm_support.to_string());
        map.insert("current_tfm_base".to_string(), self.current_tfm_base.clone());
        map.insert("lts_tfm_base".to_string(), self.lts_tfm_base.clone());
        map.insert("preview_tfm_base".to_string(), self.preview_tfm_base.clone());
        map.insert(
            "windows_sdk_version".to_string(),
            self.windows_sdk_version.clone(),
        );
        map.insert("max_retries".to_string(), self.max_retries.to_string());
        map.insert(
            "retry_base_delay_ms".to_string(),
            self.retry_base_delay_ms.to_string(),
        );
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert("package_sources".to_string(), self.package_sources.join(","));
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for DotportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dotport Configuration:")?;
        writeln!(f, "  TFM Support: {}", self.tfm_support)?;
        writeln!(f, "  App TFM: {}", self.app_tfm_base())?;
        writeln!(f, "  Windows SDK Version: {}", self.windows_sdk_version)?;
        writeln!(f, "  Max Retries: {}", self.max_retries)?;
        writeln!(f, "  Retry Base Delay: {}ms", self.retry_base_delay_ms)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Package Sources: {}", self.package_sources.join(", "))?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(value) => value.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            field: name.to_string(),
            error: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

// Full parsing lives in dotport-msbuild; this only rejects obvious garbage.
fn looks_like_net_tfm(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("net") else {
        return false;
    };
    let version = rest.split('-').next().unwrap_or("");
    let mut parts = version.split('.');
    matches!(
        (parts.next(), parts.next()),
        (Some(major), Some(minor))
            if major.parse::<u32>().map(|m| m >= 5).unwrap_or(false)
                && minor.parse::<u32>().is_ok()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "DOTPORT_TFM_SUPPORT",
            "DOTPORT_CURRENT_TFM",
            "DOTPORT_LTS_TFM",
            "DOTPORT_PREVIEW_TFM",
            "DOTPORT_WINDOWS_SDK_VERSION",
            "DOTPORT_MAX_RETRIES",
            "DOTPORT_RETRY_BASE_DELAY_MS",
            "DOTPORT_REQUEST_TIMEOUT",
            "DOTPORT_PACKAGE_SOURCES",
            "DOTPORT_LOG_LEVEL",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DotportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.app_tfm_base(), "net8.0");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_app_tfm_base_follows_support_level() {
        let mut config = DotportConfig::default();
        config.tfm_support = TfmSupport::Current;
        assert_eq!(config.app_tfm_base(), "net9.0");
        config.tfm_support = TfmSupport::Preview;
        assert_eq!(config.app_tfm_base(), "net10.0");
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("DOTPORT_TFM_SUPPORT", "current");
        env::set_var("DOTPORT_MAX_RETRIES", "5");
        env::set_var("DOTPORT_PACKAGE_SOURCES", "https://a.example/, https://b.example/");

        let config = DotportConfig::from_env().unwrap();
        assert_eq!(config.tfm_support, TfmSupport::Current);
        assert_eq!(config.max_retries, 5);
        assert_eq!(
            config.package_sources,
            vec!["https://a.example/".to_string(), "https://b.example/".to_string()]
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_number() {
        clear_env();
        env::set_var("DOTPORT_MAX_RETRIES", "many");

        let result = DotportConfig::from_env();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_support_level() {
        clear_env();
        env::set_var("DOTPORT_TFM_SUPPORT", "nightly");

        let result = DotportConfig::from_env();
        assert!(matches!(result, Err(ConfigError::InvalidTfmSupport(_))));

        clear_env();
    }

    #[test]
    fn test_validate_bounds() {
        let mut config = DotportConfig::default();
        config.max_retries = 0;
        assert!(config.validate().is_err());

        let mut config = DotportConfig::default();
        config.package_sources.clear();
        assert!(config.validate().is_err());

        let mut config = DotportConfig::default();
        config.lts_tfm_base = "net48".to_string();
        assert!(config.validate().is_err());

        let mut config = DotportConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_map_contains_all_fields() {
        let map = DotportConfig::default().to_display_map();
        assert_eq!(map.get("lts_tfm_base"), Some(&"net8.0".to_string()));
        assert_eq!(map.get("max_retries"), Some(&"3".to_string()));
        assert!(map.contains_key("package_sources"));
    }

    #[test]
    fn test_display() {
        let text = DotportConfig::default().to_string();
        assert!(text.contains("Dotport Configuration:"));
        assert!(text.contains("App TFM: net8.0"));
    }
}
