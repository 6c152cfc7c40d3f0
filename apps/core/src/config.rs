//! Runtime configuration, read once from the environment (and `.env`) at startup.

use secrecy::SecretString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use validator::Validate;

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
/// Accepted range of `COMPLETION_TIMEOUT_SECS`.
pub const TIMEOUT_SECS_RANGE: std::ops::RangeInclusive<u64> = 1..=600;
pub const DEFAULT_SYSTEM_PROMPT: &str = "Ты полезный AI-ассистент для сообщества ВКонтакте. Отвечай на русском языке кратко и понятно. Будь дружелюбным и помогай пользователям.";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" | "bunyan" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Settings of the remote completion gateway.
#[derive(Debug, Clone, Validate)]
pub struct GatewayConfig {
    /// Base URL of the chat-completions API (without `/chat/completions`).
    pub base_url: Url,
    /// The identifier of the model to request.
    #[validate(length(min = 1))]
    pub model: String,
    /// Bearer credential. Without it the gateway is not used at all.
    pub api_key: Option<SecretString>,
    #[validate(range(min = 1, max = 8192))]
    pub max_tokens: u32,
    /// Controls the creativity of the model's responses. Value between 0.0 and 2.0.
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    /// Sent as the first message of every completion request.
    #[validate(length(min = 1))]
    pub system_prompt: String,
    /// Upper bound of a single outbound call.
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("Invalid default base URL"),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_tokens: 2000,
            temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    #[validate(nested)]
    pub gateway: GatewayConfig,
    /// Maximum question length, in characters.
    #[validate(range(min = 1, max = 100_000))]
    pub max_question_chars: usize,
    /// Maximum number of job listings in one answer.
    #[validate(range(min = 1, max = 50))]
    pub job_result_cap: usize,
    /// Answer with the generic template when the gateway is unavailable.
    pub fallback_enabled: bool,
    /// Offset of the community's local time, used for time questions.
    pub utc_offset_hours: i32,
    /// Where the terminal client keeps its history.
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            gateway: GatewayConfig::default(),
            max_question_chars: 2000,
            job_result_cap: 5,
            fallback_enabled: true,
            utc_offset_hours: 5,
            data_dir: PathBuf::from("data"),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if present) and then reads the process environment.
    pub fn load() -> Result<Self, AppError> {
        // A missing .env file is the normal case in production.
        let _ = dotenv::dotenv();
        Self::from_env()
    }

    /// Reads the configuration from the process environment only.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let bind_addr = match optional_env("BIND_ADDR") {
            Some(addr) => parse_value("BIND_ADDR", &addr)?,
            None => {
                let port: u16 = parse_optional_env("PORT", defaults.bind_addr.port())?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let base_url = match optional_env("DEEPSEEK_BASE_URL") {
            Some(raw) => Url::parse(raw.trim_end_matches('/'))?,
            None => defaults.gateway.base_url,
        };

        let timeout_secs: u64 =
            parse_optional_env("COMPLETION_TIMEOUT_SECS", defaults.gateway.timeout.as_secs())?;
        if !TIMEOUT_SECS_RANGE.contains(&timeout_secs) {
            return Err(AppError::Config(format!(
                "invalid value for COMPLETION_TIMEOUT_SECS: {} is outside {}..={}",
                timeout_secs,
                TIMEOUT_SECS_RANGE.start(),
                TIMEOUT_SECS_RANGE.end()
            )));
        }

        let gateway = GatewayConfig {
            base_url,
            model: optional_env("DEEPSEEK_MODEL").unwrap_or(defaults.gateway.model),
            api_key: optional_env("DEEPSEEK_API_KEY").map(SecretString::from),
            max_tokens: parse_optional_env("DEEPSEEK_MAX_TOKENS", defaults.gateway.max_tokens)?,
            temperature: parse_optional_env("DEEPSEEK_TEMPERATURE", defaults.gateway.temperature)?,
            system_prompt: optional_env("SYSTEM_PROMPT").unwrap_or(defaults.gateway.system_prompt),
            timeout: Duration::from_secs(timeout_secs),
        };

        let config = Self {
            bind_addr,
            gateway,
            max_question_chars: parse_optional_env(
                "MAX_QUESTION_CHARS",
                defaults.max_question_chars,
            )?,
            job_result_cap: parse_optional_env("JOB_RESULT_CAP", defaults.job_result_cap)?,
            fallback_enabled: parse_optional_env("FALLBACK_ENABLED", defaults.fallback_enabled)?,
            utc_offset_hours: parse_optional_env("UTC_OFFSET_HOURS", defaults.utc_offset_hours)?,
            data_dir: optional_env("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_format: parse_optional_env("LOG_FORMAT", defaults.log_format)?,
        };

        config.validate()?;
        if !(-12..=14).contains(&config.utc_offset_hours) {
            return Err(AppError::Config(format!(
                "invalid value for UTC_OFFSET_HOURS: {} is outside -12..=14",
                config.utc_offset_hours
            )));
        }
        Ok(config)
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid value for {}: {}", key, e)))
}

fn parse_optional_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| parse_value(key, &raw))
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}
