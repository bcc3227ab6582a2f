// config.rs
use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::service::billing::is_whole_cents;

#[derive(Debug, Clone)]
pub struct Config {
    /// When unset the service keeps everything in memory.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub port: u16,
    pub default_rate_per_hour: BigDecimal,
    pub cors_origins: Vec<String>,
    /// Catalog/user JSON loaded into the in-memory store at startup.
    pub seed_file: Option<String>,
}

impl Config {
    pub fn init() -> anyhow::Result<Config> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let jwt_secret = std::env::var("JWT_SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET_KEY must be set"))?;

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()?;
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".to_string())
            .parse::<u32>()?;
        let default_rate_per_hour = BigDecimal::from_str(
            &std::env::var("DEFAULT_RATE_PER_HOUR").unwrap_or_else(|_| "50".to_string()),
        )?;
        if default_rate_per_hour < BigDecimal::from(0) {
            anyhow::bail!("DEFAULT_RATE_PER_HOUR cannot be negative");
        }
        if !is_whole_cents(&default_rate_per_hour) {
            anyhow::bail!("DEFAULT_RATE_PER_HOUR cannot have more than 2 decimal places");
        }

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["http://localhost:5173".to_string()]);

        let seed_file = std::env::var("SEED_FILE").ok().filter(|path| !path.is_empty());

        Ok(Config {
            database_url,
            db_max_connections,
            jwt_secret,
            port,
            default_rate_per_hour,
            cors_origins,
            seed_file,
        })
    }
}
