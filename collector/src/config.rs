use chrono_tz::Tz;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// IANA name of the single civil time zone all timestamps are captured
    /// in, for comparability across the study.
    pub timezone: String,
    pub export_dir: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let timezone = settings
            .get_string("study.timezone")
            .or_else(|_| env::var("STUDY_TIMEZONE"))
            .unwrap_or_else(|_| "America/Edmonton".to_string());

        let export_dir = settings
            .get_string("study.export_dir")
            .or_else(|_| env::var("STUDY_EXPORT_DIR"))
            .unwrap_or_else(|_| "exports".to_string());

        Ok(Config {
            timezone,
            export_dir,
        })
    }

    /// Resolves the configured zone name against the tz database.
    pub fn tz(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("Unknown time zone: {}", self.timezone))
    }
}
