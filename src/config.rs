//! Config module contains the initial configuration of app
use std::env;

use config_crate::{Config as RawConfig, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: Server,
}

/// Basic settings - server local address, port and database
#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: String,
    pub database: String,
    pub thread_count: usize,
}

impl Config {
    /// Creates config from base.toml, which are overwritten by
    /// <RUN_MODE>.toml and environment variables with PROMO prefix
    pub fn new() -> Result<Self, ConfigError> {
        let mut s = RawConfig::new();
        s.merge(File::with_name("config/base"))?;

        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        s.merge(File::with_name(&format!("config/{}", env)).required(false))?;

        s.merge(Environment::with_prefix("PROMO"))?;

        s.try_into()
    }
}
