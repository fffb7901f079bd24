use std::env;

/// Runtime configuration from the environment, with dev defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub cleanup_interval_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: var_or("DATABASE_URL", "sqlite:campuslink.db?mode=rwc"),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:8080"),
            cleanup_interval_secs: var_or("CLEANUP_INTERVAL_SECS", "300")
                .parse()
                .unwrap_or_else(|err| {
                    log::warn!("invalid CLEANUP_INTERVAL_SECS: {err}");
                    300
                }),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) => value,
        Err(_) => {
            log::info!("{key} not set, using default {default}");
            default.to_owned()
        }
    }
}
