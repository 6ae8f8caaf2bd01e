use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub timetable_api_url: String,
    pub database_url: String,
    pub timezone: Tz,
    pub langs_dir: String,
    pub default_lang: String,
    pub http_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any name to value lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_bot_token = required(&lookup, "TELEGRAM_BOT_TOKEN")?;
        let timetable_api_url = required(&lookup, "TIMETABLE_API_URL")?;

        let database_url = or_default(&lookup, "DATABASE_URL", "sqlite:./data/class-reminder.db");

        let timezone_name = or_default(&lookup, "TIMEZONE", "Europe/Kyiv");
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|_| anyhow!("Invalid TIMEZONE: {}", timezone_name))?;

        let langs_dir = or_default(&lookup, "LANGS_DIR", "langs");
        let default_lang = or_default(&lookup, "DEFAULT_LANG", "en");

        let http_port = or_default(&lookup, "HTTP_PORT", "3000")
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        Ok(Config {
            telegram_bot_token,
            timetable_api_url,
            database_url,
            timezone,
            langs_dir,
            default_lang,
            http_port,
        })
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(anyhow!("{} must be set", name)),
    }
}

fn or_default<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}
