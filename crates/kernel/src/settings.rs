use std::path::PathBuf;

use anyhow::{anyhow, Context};
use lendshelf_db::StoreSettings;
use serde::{Deserialize, Serialize};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LENDSHELF_ENV";
const CONFIG_DIR_ENV: &str = "LENDSHELF_CONFIG_DIR";
const ENV_PREFIX: &str = "LENDSHELF";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub lending: LendingSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay
    /// and `LENDSHELF_*` variables (`__` separates nested keys).
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load from an explicit config directory and environment name.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_environment: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The selected environment wins over anything a file declares.
        settings.environment = parsed_environment;

        if settings.lending.borrow_limit == 0 {
            return Err(anyhow!("lending.borrow_limit must be at least 1"));
        }

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Visual variant of the book detail view.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetailTheme {
    #[default]
    Gradient,
    Plain,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LendingSettings {
    #[serde(default = "LendingSettings::default_borrow_limit")]
    pub borrow_limit: usize,
    #[serde(default)]
    pub detail_theme: DetailTheme,
}

impl LendingSettings {
    pub const DEFAULT_BORROW_LIMIT: usize = 3;

    fn default_borrow_limit() -> usize {
        Self::DEFAULT_BORROW_LIMIT
    }
}

impl Default for LendingSettings {
    fn default() -> Self {
        Self {
            borrow_limit: Self::default_borrow_limit(),
            detail_theme: DetailTheme::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lendshelf_db::StoreBackend;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "lendshelf-settings-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_borrow_limit_is_three() {
        let settings = Settings::default();
        assert_eq!(settings.lending.borrow_limit, 3);
        assert_eq!(settings.lending.detail_theme, DetailTheme::Gradient);
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = scratch_dir();
        let settings = Settings::load_from(&dir, "local").unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(settings.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn environment_file_overlays_base() {
        let dir = scratch_dir();
        std::fs::write(
            dir.join("base.toml"),
            "[server]\nport = 9000\n\n[store]\nbackend = \"file\"\npath = \"base.json\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("staging.toml"),
            "[store]\npath = \"staging.json\"\n\n[lending]\ndetail_theme = \"plain\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(&dir, "staging").unwrap();

        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.store.backend, StoreBackend::File);
        assert_eq!(settings.store.path, PathBuf::from("staging.json"));
        assert_eq!(settings.lending.detail_theme, DetailTheme::Plain);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let dir = scratch_dir();
        let err = Settings::load_from(&dir, "qa").unwrap_err();
        assert!(err.to_string().contains("unsupported environment"));
    }

    #[test]
    fn zero_borrow_limit_is_rejected() {
        let dir = scratch_dir();
        std::fs::write(dir.join("base.toml"), "[lending]\nborrow_limit = 0\n").unwrap();

        assert!(Settings::load_from(&dir, "local").is_err());
    }
}
