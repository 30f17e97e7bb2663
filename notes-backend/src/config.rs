use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
    /// Path to the SQLite file, or ":memory:" for a throwaway database.
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Hours a login session stays valid after its last use.
    pub const SESSION_TTL_HOURS: &str = "SESSION_TTL_HOURS";
    /// Set to "true" or "1" to mark the session cookie as Secure (HTTPS only).
    pub const SECURE_COOKIES: &str = "SECURE_COOKIES";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const BIND_ADDRESS: &str = "0.0.0.0";
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const SESSION_TTL_HOURS: i64 = 24 * 14;
    pub const SECURE_COOKIES: bool = false;
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub database_url: String,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            bind_address: defaults::BIND_ADDRESS.to_string(),
            database_url: defaults::DATABASE_URL.to_string(),
            session_ttl_hours: defaults::SESSION_TTL_HOURS,
            secure_cookies: defaults::SECURE_COOKIES,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unparseable values fall
    /// back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or_default(&lookup, env_vars::PORT, defaults::PORT);

        let session_ttl_hours =
            match parse_or_default(&lookup, env_vars::SESSION_TTL_HOURS, defaults::SESSION_TTL_HOURS) {
                ttl if ttl > 0 => ttl,
                ttl => {
                    log::warn!(
                        "{} must be positive (got {}), using {}",
                        env_vars::SESSION_TTL_HOURS,
                        ttl,
                        defaults::SESSION_TTL_HOURS
                    );
                    defaults::SESSION_TTL_HOURS
                }
            };

        let secure_cookies = lookup(env_vars::SECURE_COOKIES)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1"))
            .unwrap_or(defaults::SECURE_COOKIES);

        Self {
            port,
            bind_address: lookup(env_vars::BIND_ADDRESS)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| defaults::BIND_ADDRESS.to_string()),
            database_url: lookup(env_vars::DATABASE_URL)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            session_ttl_hours,
            secure_cookies,
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {} value {:?}, using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}
