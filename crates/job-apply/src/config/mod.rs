use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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
    pub agent: AgentConfig,
    pub fixtures: FixturesConfig,
    pub employers_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        let cors_origins = env::var("APP_CORS_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|_| default_cors_origins());

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let runtime_url =
            env::var("AGENT_RUNTIME_URL").unwrap_or_else(|_| "http://127.0.0.1:8787".to_string());
        let api_key = env::var("AGENT_RUNTIME_API_KEY")
            .or_else(|_| env::var("BROWSER_USE_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let default_model =
            env::var("AGENT_DEFAULT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let test_model =
            env::var("AGENT_TEST_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let research_model =
            env::var("AGENT_RESEARCH_MODEL").unwrap_or_else(|_| "gpt-4.1".to_string());
        let pass_timeout_secs = parse_u64("AGENT_PASS_TIMEOUT_SECS", 600)?;
        let poll_interval_ms = parse_u64("AGENT_POLL_INTERVAL_MS", 2000)?;

        let fixtures_dir =
            env::var("JOB_APPLY_FIXTURES_DIR").unwrap_or_else(|_| "mock".to_string());
        let employers_file = env::var("JOB_APPLY_EMPLOYERS_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                cors_origins,
            },
            telemetry: TelemetryConfig { log_level },
            agent: AgentConfig {
                runtime_url,
                api_key,
                default_model,
                test_model,
                research_model,
                pass_timeout: Duration::from_secs(pass_timeout_secs),
                poll_interval: Duration::from_millis(poll_interval_ms),
            },
            fixtures: FixturesConfig {
                dir: PathBuf::from(fixtures_dir),
            },
            employers_file,
        })
    }
}

fn parse_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidDuration { var }),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:5174".to_string(),
        "*".to_string(),
    ]
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
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

    /// A `*` entry opens the service to any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Connection and model settings for the external agent runtime.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub runtime_url: String,
    pub api_key: Option<String>,
    pub default_model: String,
    pub test_model: String,
    pub research_model: String,
    /// Deadline applied to each agent pass.
    pub pass_timeout: Duration,
    pub poll_interval: Duration,
}

/// Location of the mock applicant profile and resume used by the test endpoint.
#[derive(Debug, Clone)]
pub struct FixturesConfig {
    pub dir: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDuration { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDuration { var } => {
                write!(f, "{var} must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDuration { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
