/// Configuration management for the API server
///
/// Configuration is read from environment variables; a `.env` file in the
/// working directory is loaded first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 3000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, or `*` (default: `*`)
/// - `PRODUCTION`: `true` for JSON log output (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 characters (required)
/// - `JWT_EXPIRATION_HOURS`: Session token lifetime (default: 168)
/// - `SENDGRID_API_KEY`: Mail API key; email is disabled without it
/// - `MAIL_FROM`: Sender address for account emails
/// - `SENDGRID_API_URL`: Mail API endpoint override
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use taskit_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use taskit_shared::mail::{MailConfig, SENDGRID_API_URL};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Outgoing mail configuration
    pub mail: MailSettings,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Production mode; logs are written as JSON lines
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 characters.
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Session token lifetime in hours
    pub expiration_hours: i64,
}

/// Mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    /// SendGrid API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Sender address
    pub from_address: String,

    /// Mail API endpoint
    pub api_url: String,
}

impl From<&MailSettings> for MailConfig {
    fn from(settings: &MailSettings) -> Self {
        MailConfig {
            api_key: settings.api_key.clone(),
            from_address: settings.from_address.clone(),
            api_url: settings.api_url.clone(),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated origin list
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is shorter than 32 characters
    /// - A numeric or boolean variable doesn't parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env_or::<u16>("API_PORT", 3000)?;
        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );
        let production = env_or::<bool>("PRODUCTION", false)?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = env_or::<u32>("DATABASE_MAX_CONNECTIONS", 10)?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expiration_hours = env_or::<i64>("JWT_EXPIRATION_HOURS", 168)?;
        if expiration_hours <= 0 {
            anyhow::bail!("JWT_EXPIRATION_HOURS must be positive");
        }

        let defaults = MailConfig::default();
        let mail = MailSettings {
            api_key: env::var("SENDGRID_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            from_address: env::var("MAIL_FROM").unwrap_or(defaults.from_address),
            api_url: env::var("SENDGRID_API_URL").unwrap_or_else(|_| SENDGRID_API_URL.to_string()),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours,
            },
            mail,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Session token lifetime
    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.expiration_hours)
    }

    /// Configuration for tests: local database, fixed secret, mail disabled
    pub fn for_tests(database_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: database_url.into(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expiration_hours: 168,
            },
            mail: MailSettings {
                api_key: None,
                from_address: MailConfig::default().from_address,
                api_url: SENDGRID_API_URL.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = Config::for_tests("postgresql://localhost/test");
        config.api.port = 3000;

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://localhost:3000, https://taskit.app,"),
            vec!["http://localhost:3000", "https://taskit.app"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_env_or_parses_flags() {
        assert!(!env_or::<bool>("TASKIT_TEST_UNSET_FLAG", false).unwrap());

        env::set_var("TASKIT_TEST_PRODUCTION_FLAG", " true ");
        assert!(env_or::<bool>("TASKIT_TEST_PRODUCTION_FLAG", false).unwrap());

        env::set_var("TASKIT_TEST_BAD_FLAG", "sometimes");
        assert!(env_or::<bool>("TASKIT_TEST_BAD_FLAG", false).is_err());

        assert!(!Config::for_tests("postgresql://localhost/test").api.production);
    }

    #[test]
    fn test_token_lifetime() {
        let config = Config::for_tests("postgresql://localhost/test");
        assert_eq!(config.token_lifetime(), chrono::Duration::days(7));
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut config = Config::for_tests("postgresql://localhost/test");
        config.mail.api_key = Some("SG.secret".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("test-secret-key"));
        assert!(!json.contains("SG.secret"));
    }

    #[test]
    fn test_mail_config_conversion() {
        let mut config = Config::for_tests("postgresql://localhost/test");
        config.mail.api_key = Some("SG.key".to_string());

        let mail: MailConfig = (&config.mail).into();
        assert_eq!(mail.api_key.as_deref(), Some("SG.key"));
        assert_eq!(mail.api_url, SENDGRID_API_URL);
    }
}
