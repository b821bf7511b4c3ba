use std::str::FromStr;
use thiserror::Error;

pub const TOKEN_VAR: &str = "TELOXIDE_TOKEN";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_path: String,
    pub trial_days: i64,
    pub trial_credits: i64,
    pub credit_price: i64,
    pub admin_contact: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("Файл .env не загружен: {}", e);
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup(TOKEN_VAR)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing(TOKEN_VAR))?;

        Ok(Self {
            bot_token,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "users.db".into()),
            trial_days: parse_positive_or(&lookup, "TRIAL_DAYS", 3)?,
            trial_credits: parse_positive_or(&lookup, "TRIAL_CREDITS", 10)?,
            credit_price: parse_positive_or(&lookup, "CREDIT_PRICE", 10)?,
            admin_contact: lookup("ADMIN_CONTACT").unwrap_or_else(|| "@admin".into()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    let parsed = raw.trim().parse::<T>();
    match parsed {
        Ok(value) => Ok(value),
        Err(_) => Err(ConfigError::Invalid { name, value: raw }),
    }
}

// Для дней, пробных токенов и цены допустимы только значения >= 1
fn parse_positive_or<F>(lookup: &F, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, name, default)?;
    if value < 1 {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}
