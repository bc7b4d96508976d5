use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub onboarding: OnboardingConfig,
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
            onboarding: OnboardingConfig::from_env()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

const DEFAULT_ADMIN_EMAIL: &str = "Contactus@sssdistributors.com";
const DEFAULT_STORAGE_ROOT: &str = "Onboarding";
const DEFAULT_BRAND: &str = "SSS Distributors";

/// Delivery settings for completed submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingConfig {
    /// Mailbox that receives every submission with the archive attached.
    pub admin_email: String,
    /// Object-store folders above the per-family folder.
    pub storage_root: Vec<String>,
    /// Distributor name used in notification text.
    pub brand: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            storage_root: parse_storage_root(DEFAULT_STORAGE_ROOT),
            brand: DEFAULT_BRAND.to_string(),
        }
    }
}

impl OnboardingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let admin_email = env::var("ONBOARDING_ADMIN_EMAIL")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
        if !admin_email.contains('@') {
            return Err(ConfigError::InvalidAdminEmail { value: admin_email });
        }

        let storage_root = parse_storage_root(
            &env::var("ONBOARDING_STORAGE_ROOT").unwrap_or_else(|_| DEFAULT_STORAGE_ROOT.to_string()),
        );
        let brand = env::var("ONBOARDING_BRAND").unwrap_or_else(|_| DEFAULT_BRAND.to_string());

        Ok(Self {
            admin_email,
            storage_root,
            brand,
        })
    }
}

fn parse_storage_root(raw: &str) -> Vec<String> {
    raw.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAdminEmail { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAdminEmail { value } => {
                write!(f, "ONBOARDING_ADMIN_EMAIL must be an email address, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidAdminEmail { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
