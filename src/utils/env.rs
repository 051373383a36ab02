// src/utils/env.rs
use log::info;

/// Load a .env file when one exists. Variables already set in the process
/// environment always win.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(_) => info!("No .env file found, using environment variables from system"),
    }
}
