use std::env;
use std::time::Duration;

use auth::PasswordPolicy;
use auth::TokenCodec;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub token: TokenConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
    #[serde(default)]
    pub operations: OperationsConfig,
    /// Account created at startup when absent
    #[serde(default)]
    pub seed: Option<SeedAccountConfig>,
}

#[derive(Deserialize, Clone)]
pub struct TokenConfig {
    pub secret: String,
    #[serde(default = "default_token_lifetime_seconds")]
    pub lifetime_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; the in-memory backends are used when unset
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    #[serde(default = "default_true")]
    pub enforce_policy: bool,
    #[serde(default = "default_min_password_length")]
    pub min_length: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweeperConfig {
    #[serde(default = "default_sweep_interval_seconds")]
    pub interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OperationsConfig {
    /// Per store call; 0 disables the deadline
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Deserialize, Clone)]
pub struct SeedAccountConfig {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

fn default_token_lifetime_seconds() -> i64 {
    86_400
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_min_password_length() -> usize {
    PasswordPolicy::DEFAULT_MIN_LENGTH
}

fn default_sweep_interval_seconds() -> u64 {
    3_600
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            enforce_policy: true,
            min_length: default_min_password_length(),
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

// Secrets stay out of startup logs.
impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("lifetime_seconds", &self.lifetime_seconds)
            .finish()
    }
}

impl std::fmt::Debug for SeedAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAccountConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

impl TokenConfig {
    /// Saturates rather than overflowing; the codec rejects out-of-range values.
    pub fn lifetime(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.lifetime_seconds)
            .unwrap_or_else(chrono::Duration::max_value)
    }
}

impl PasswordConfig {
    /// Policy applied to new passwords, if enforced.
    pub fn policy(&self) -> Option<PasswordPolicy> {
        self.enforce_policy.then(|| PasswordPolicy::new(self.min_length))
    }
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl OperationsConfig {
    pub fn deadline(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TOKEN__SECRET, DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        // Example: TOKEN__LIFETIME_SECONDS=3600 overrides token.lifetime_seconds
        Self::layered(&run_mode, Environment::default().separator("__"))
    }

    fn layered(run_mode: &str, environment: Environment) -> Result<Self, ConfigError> {
        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment)
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.secret.is_empty() {
            return Err(ConfigError::Message("token.secret must not be empty".to_string()));
        }
        if !(1..=TokenCodec::MAX_LIFETIME_SECONDS).contains(&self.token.lifetime_seconds) {
            return Err(ConfigError::Message(format!(
                "token.lifetime_seconds must be between 1 and {}, got {}",
                TokenCodec::MAX_LIFETIME_SECONDS,
                self.token.lifetime_seconds
            )));
        }
        if self.sweeper.interval_seconds == 0 {
            return Err(ConfigError::Message(
                "sweeper.interval_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
