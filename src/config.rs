//! Server configuration.
//!
//! The only externally visible knobs are the listening port and the
//! database path, both resolved from the environment with CLI overrides
//! applied in `main`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "taskdeck.db";

/// Runtime configuration for the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listening port (env: PORT, default 3000).
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database path (env: TASKDECK_DB, default "taskdeck.db").
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_path: default_db_path(),
        }
    }
}

impl Config {
    /// Resolve configuration from the environment.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => {
                    tracing::warn!("Ignoring unparseable PORT value: {}", port);
                }
            }
        }

        if let Ok(path) = std::env::var("TASKDECK_DB")
            && !path.is_empty()
        {
            config.db_path = PathBuf::from(path);
        }

        config
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}
