/// Database configuration and connection management
pub mod database;

/// Master data and alert policy loading from config.toml
pub mod master;
