/// Database configuration and connection management
pub mod database;

/// Seed data (categories, bootstrap admin) loaded from config.toml
pub mod seed;

/// Listener and file locations read from environment variables
pub mod server;
