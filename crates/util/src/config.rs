use std::{env, fmt, net::SocketAddr};

use super::server_bind_address;

/// Default sender address used when `MAIL_SENDER` is not provided.
pub const DEFAULT_MAIL_SENDER: &str = "no-reply@consult-intake.local";

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Mail relay settings, present only when the relay is fully provisioned.
///
/// `MAIL_API_URL` and `MAIL_API_TOKEN` gate activation; when either is
/// missing the notification step is skipped entirely. The recipient falls
/// back to the sender address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub api_url: String,
    pub api_token: String,
    pub sender: String,
    pub notify_to: String,
}

impl MailSettings {
    fn from_env() -> Option<Self> {
        let api_url = env::var("MAIL_API_URL").ok()?;
        let api_token = env::var("MAIL_API_TOKEN").ok()?;
        let sender =
            env::var("MAIL_SENDER").unwrap_or_else(|_| DEFAULT_MAIL_SENDER.to_string());
        let notify_to = env::var("MAIL_NOTIFY_TO").unwrap_or_else(|_| sender.clone());

        Some(Self {
            api_url,
            api_token,
            sender,
            notify_to,
        })
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    /// Connection string for the consultation store. Absence leaves the
    /// service running but failing submissions closed.
    pub database_url: Option<String>,
    pub mail: Option<MailSettings>,
    /// Enables verbose per-request pipeline logging.
    pub submit_diagnostics: bool,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;
        let database_url = env::var("DATABASE_URL").ok();
        let mail = MailSettings::from_env();
        let submit_diagnostics = env::var("SUBMIT_DIAGNOSTICS")
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            bind_addr,
            environment,
            database_url,
            mail,
            submit_diagnostics,
        })
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_BIND_ADDR;
    use std::sync::{LazyLock, Mutex};

    static ENV_GUARD: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

    fn clear_env() {
        for key in [
            "APP_ENV",
            "APP_BIND_ADDR",
            "DATABASE_URL",
            "MAIL_API_URL",
            "MAIL_API_TOKEN",
            "MAIL_SENDER",
            "MAIL_NOTIFY_TO",
            "SUBMIT_DIAGNOSTICS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_in_development() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();

        let config = AppConfig::from_env().expect("config should load with defaults");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(config.database_url.is_none());
        assert!(config.mail.is_none());
        assert!(!config.submit_diagnostics);
    }

    #[test]
    fn rejects_invalid_environment() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("APP_ENV", "invalid");

        let err = AppConfig::from_env().expect_err("invalid env should error");
        assert!(matches!(err, ConfigError::InvalidEnvironment(value) if value == "invalid"));

        env::remove_var("APP_ENV");
    }

    #[test]
    fn mail_requires_both_url_and_token() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("MAIL_API_URL", "https://relay.example.com/v1/");

        let config = AppConfig::from_env().expect("config should load");
        assert!(config.mail.is_none());

        env::set_var("MAIL_API_TOKEN", "token");
        let config = AppConfig::from_env().expect("config should load");
        let mail = config.mail.expect("mail settings present");
        assert_eq!(mail.api_url, "https://relay.example.com/v1/");
        assert_eq!(mail.sender, DEFAULT_MAIL_SENDER);
        assert_eq!(mail.notify_to, DEFAULT_MAIL_SENDER);

        clear_env();
    }

    #[test]
    fn notify_address_falls_back_to_sender() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("MAIL_API_URL", "https://relay.example.com/v1/");
        env::set_var("MAIL_API_TOKEN", "token");
        env::set_var("MAIL_SENDER", "intake@example.com");

        let mail = AppConfig::from_env()
            .expect("config should load")
            .mail
            .expect("mail settings present");
        assert_eq!(mail.sender, "intake@example.com");
        assert_eq!(mail.notify_to, "intake@example.com");

        env::set_var("MAIL_NOTIFY_TO", "staff@example.com");
        let mail = AppConfig::from_env()
            .expect("config should load")
            .mail
            .expect("mail settings present");
        assert_eq!(mail.notify_to, "staff@example.com");

        clear_env();
    }

    #[test]
    fn parses_diagnostics_flag() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("SUBMIT_DIAGNOSTICS", "true");

        let config = AppConfig::from_env().expect("config should load");
        assert!(config.submit_diagnostics);

        env::set_var("SUBMIT_DIAGNOSTICS", "off");
        let config = AppConfig::from_env().expect("config should load");
        assert!(!config.submit_diagnostics);

        clear_env();
    }
}
