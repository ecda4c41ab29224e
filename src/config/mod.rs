/// Plan seeding from config.toml
pub mod accounts;

/// Database configuration and connection management
pub mod database;
