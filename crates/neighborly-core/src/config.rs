use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Minutes a one-time login code stays valid.
    pub login_code_ttl_minutes: i64,
    /// Wrong guesses allowed before an outstanding login code is discarded.
    pub login_code_max_attempts: i32,
    /// Days a session token stays valid.
    pub session_ttl_days: i64,
    /// Emails put on the allow list and made administrators at start-up.
    #[serde(default)]
    pub bootstrap_admins: Vec<String>,
    pub cookie_secure: bool,
    /// Log issued login codes instead of delivering them. Development only.
    pub log_login_codes: bool,
}

impl AuthConfig {
    /// ## Summary
    /// Returns true if `email` is listed as a bootstrap administrator.
    /// The comparison ignores case and surrounding whitespace.
    #[must_use]
    pub fn is_bootstrap_admin(&self, email: &str) -> bool {
        let email = crate::util::email::normalize(email);
        self.bootstrap_admins
            .iter()
            .any(|admin| crate::util::email::normalize(admin) == email)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_code_ttl_minutes: 10,
            login_code_max_attempts: 5,
            session_ttl_days: 30,
            bootstrap_admins: Vec::new(),
            cookie_secure: true,
            log_login_codes: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `config.toml` and environment variables into a `Settings`.
    /// Environment variables (`NEIGHBORLY__SECTION__KEY`) take precedence over file values.
    ///
    /// There is no fallback for a missing `database.url`: the server refuses to start
    /// instead of running with authentication disabled.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "info")?
            .set_default("auth.login_code_ttl_minutes", 10)?
            .set_default("auth.login_code_max_attempts", 5)?
            .set_default("auth.session_ttl_days", 30)?
            .set_default("auth.cookie_secure", true)?
            .set_default("auth.log_login_codes", false)?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Environment overrides the file
            .add_source(
                config::Environment::with_prefix("NEIGHBORLY")
                    .prefix_separator("__")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("auth.bootstrap_admins"),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        if settings.database.url.trim().is_empty() {
            anyhow::bail!("database.url must be set");
        }

        Ok(settings)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
