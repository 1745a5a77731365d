use std::env;
use std::str::FromStr;

/// Runtime configuration, read from the environment (after `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub users_file: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub reset_code_ttl_minutes: i64,
    pub verification_code: String,
    pub prediction_batch_size: usize,
    pub bcrypt_cost: u32,
    /// `None` allows any origin
    pub cors_origins: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3005,
            users_file: "users.json".to_string(),
            jwt_secret: "default-secret-change-me".to_string(),
            jwt_issuer: "battery-lab-service".to_string(),
            reset_code_ttl_minutes: 30,
            verification_code: "123456".to_string(),
            prediction_batch_size: 1000,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cors_origins: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port),
            users_file: env::var("USERS_FILE").unwrap_or(defaults.users_file),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            reset_code_ttl_minutes: parse_var("RESET_CODE_TTL_MINUTES", defaults.reset_code_ttl_minutes),
            verification_code: env::var("VERIFICATION_CODE").unwrap_or(defaults.verification_code),
            prediction_batch_size: parse_var("PREDICTION_BATCH_SIZE", defaults.prediction_batch_size).max(1),
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost),
            cors_origins: env::var("CORS_ORIGINS").ok().and_then(|raw| parse_origins(&raw)),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("⚠️  Invalid value for {}: {:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Option<Vec<String>> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim())
        .filter(|o| !o.is_empty() && *o != "*")
        .map(|o| o.to_string())
        .collect();

    if origins.is_empty() {
        None
    } else {
        Some(origins)
    }
}
