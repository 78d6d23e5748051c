use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

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

    /// Production responses never carry internal error detail.
    pub fn exposes_error_detail(self) -> bool {
        !matches!(self, Self::Production)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub fees: FeeConfig,
    pub voice: VoiceConfig,
    pub llm: LlmConfig,
    pub rate_limit: RateLimitConfig,
    pub documents: DocumentConfig,
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

        let filing_fee = match non_empty_var("PROBATE_FILING_FEE") {
            Some(raw) => raw
                .parse::<Decimal>()
                .ok()
                .filter(|fee| !fee.is_sign_negative())
                .ok_or(ConfigError::InvalidNumber {
                    variable: "PROBATE_FILING_FEE",
                    value: raw,
                })?,
            None => Decimal::from(200),
        };

        let voice = VoiceConfig {
            api_key: non_empty_var("RETELL_API_KEY"),
            base_url: non_empty_var("RETELL_BASE_URL")
                .unwrap_or_else(|| "https://api.retellai.com".to_string()),
            timeout: Duration::from_millis(parse_number("RETELL_TIMEOUT_MS", 8_000)?),
            agent_id: non_empty_var("RETELL_AGENT_ID"),
            from_number: non_empty_var("RETELL_FROM_NUMBER"),
        };

        let llm = LlmConfig {
            api_url: non_empty_var("LLM_API_URL"),
            api_key: non_empty_var("LLM_API_KEY"),
            model: non_empty_var("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_number("RATE_LIMIT_MAX_REQUESTS", 10)?,
            window: Duration::from_secs(parse_number("RATE_LIMIT_WINDOW_SECS", 60)?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            fees: FeeConfig {
                filing_fee,
                schedule_path: non_empty_var("PROBATE_FEE_SCHEDULE").map(PathBuf::from),
            },
            voice,
            llm,
            rate_limit,
            documents: DocumentConfig {
                chromium_path: non_empty_var("CHROMIUM_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("chromium")),
            },
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Values outside the target type's range are rejected like any other malformed number.
fn parse_number<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber {
            variable: name,
            value: raw,
        }),
        None => Ok(default),
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

/// Court fee inputs. The bracket table is legal configuration, not business logic.
#[derive(Debug, Clone)]
pub struct FeeConfig {
    pub filing_fee: Decimal,
    pub schedule_path: Option<PathBuf>,
}

/// Voice-call vendor credentials. The API key doubles as the webhook signing secret.
#[derive(Clone)]
pub struct VoiceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub agent_id: Option<String>,
    pub from_number: Option<String>,
}

impl fmt::Debug for VoiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("agent_id", &self.agent_id)
            .field("from_number", &self.from_number)
            .finish()
    }
}

/// Chat-completions endpoint used for will extraction.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

/// Limits applied to unauthenticated endpoints.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub chromium_path: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a non-negative number (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
        }
    }
}
