use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::installers::validation::{ValidationConfig, DEFAULT_DEPRECATED_WINE_VERSIONS};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub installers: InstallerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            installers: InstallerConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Installer corpus settings: deprecated wine builds, default prefix arch, seed directory.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    pub deprecated_wine_versions: Vec<String>,
    pub default_wine_arch: String,
    pub seed_dir: Option<PathBuf>,
}

impl InstallerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let deprecated_wine_versions = match env::var("LUTRIS_DEPRECATED_WINE_VERSIONS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|version| !version.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => DEFAULT_DEPRECATED_WINE_VERSIONS
                .iter()
                .map(|version| version.to_string())
                .collect(),
        };

        let default_wine_arch = env::var("LUTRIS_DEFAULT_WINE_ARCH")
            .map(|arch| arch.trim().to_ascii_lowercase())
            .unwrap_or_else(|_| "win64".to_string());
        if default_wine_arch != "win32" && default_wine_arch != "win64" {
            return Err(ConfigError::InvalidWineArch(default_wine_arch));
        }

        let seed_dir = env::var("LUTRIS_INSTALLERS_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            deprecated_wine_versions,
            default_wine_arch,
            seed_dir,
        })
    }

    pub fn validation(&self) -> ValidationConfig {
        ValidationConfig {
            deprecated_wine_versions: self.deprecated_wine_versions.clone(),
            default_wine_arch: self.default_wine_arch.clone(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidWineArch(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { source } => {
                write!(f, "APP_HOST must be a valid IP address ({source})")
            }
            ConfigError::InvalidWineArch(arch) => {
                write!(f, "LUTRIS_DEFAULT_WINE_ARCH must be win32 or win64, got '{arch}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidWineArch(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "LUTRIS_DEPRECATED_WINE_VERSIONS",
            "LUTRIS_DEFAULT_WINE_ARCH",
            "LUTRIS_INSTALLERS_DIR",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.installers.default_wine_arch, "win64");
        assert!(config.installers.seed_dir.is_none());
        assert_eq!(
            config.installers.deprecated_wine_versions.len(),
            DEFAULT_DEPRECATED_WINE_VERSIONS.len()
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_deprecated_wine_list_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LUTRIS_DEPRECATED_WINE_VERSIONS", " lutris-5.0-x86_64, ,tkg-4.0 ");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.installers.deprecated_wine_versions,
            vec!["lutris-5.0-x86_64".to_string(), "tkg-4.0".to_string()]
        );
        assert!(config
            .installers
            .validation()
            .is_deprecated_wine("tkg-4.0"));
        reset_env();
    }

    #[test]
    fn rejects_unknown_wine_arch() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LUTRIS_DEFAULT_WINE_ARCH", "arm64");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidWineArch(arch)) if arch == "arm64"
        ));
        reset_env();
    }
}
