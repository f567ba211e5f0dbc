//! Seed data loading from config.toml
//!
//! The seed file lists pay categories that must exist and, optionally, a bootstrap
//! system administrator. Seeding is additive: existing categories are left alone and
//! the admin is only created when no system administrator exists yet.

use crate::entities::{Category, Role, User, category, user};
use crate::errors::{Error, Result};
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Pay categories to create when missing
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    /// Bootstrap administrator, created only if no system admin exists
    pub admin: Option<AdminConfig>,
}

/// Configuration for a single category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Unique category name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: String,
}

/// Configuration for the bootstrap administrator
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Login name
    pub username: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// Contact phone
    #[serde(default)]
    pub phone: String,
}

/// What a seeding run actually inserted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Number of categories inserted
    pub categories_created: usize,
    /// Id of the admin that was created, if one was
    pub admin_created: Option<i64>,
}

/// Parses seed configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<SeedConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed config: {e}"),
    })
}

/// Loads seed configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads seed configuration if the file exists, otherwise returns an empty config.
pub fn load_optional_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        debug!(?path, "No seed config found, skipping seeding");
        Ok(SeedConfig::default())
    }
}

/// Inserts missing categories and the bootstrap admin.
pub async fn seed_database(db: &DatabaseConnection, config: &SeedConfig) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for entry in &config.categories {
        let name = entry.name.trim();
        if name.is_empty() {
            continue;
        }
        let exists = Category::find()
            .filter(category::Column::Name.eq(name))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        category::ActiveModel {
            name: Set(name.to_string()),
            description: Set(entry.description.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        report.categories_created += 1;
    }

    if let Some(admin) = &config.admin {
        let has_admin = User::find()
            .filter(user::Column::Role.eq(Role::SystemAdmin))
            .one(db)
            .await?
            .is_some();
        if !has_admin {
            let created = user::ActiveModel {
                username: Set(admin.username.trim().to_string()),
                first_name: Set(admin.first_name.clone()),
                last_name: Set(admin.last_name.clone()),
                email: Set(admin.email.clone()),
                phone: Set(admin.phone.clone()),
                national_id: Set(String::new()),
                role: Set(Role::SystemAdmin),
                is_superuser: Set(true),
                is_active: Set(true),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            info!(user_id = created.id, "Bootstrap system admin created");
            report.admin_created = Some(created.id);
        }
    }

    Ok(report)
}
