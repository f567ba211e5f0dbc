//! User entity - Represents an account that can act on the system.
//!
//! Authentication happens elsewhere; this table only carries the profile, the role that
//! drives every visibility decision, and the `is_active` flag used for soft disabling.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The three roles an account can hold.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access to every site and every record
    #[sea_orm(string_value = "SYSTEM_ADMIN")]
    SystemAdmin,
    /// Oversees the sites where they are chief, approves payroll submissions
    #[sea_orm(string_value = "CHIEF_ENGINEER")]
    ChiefEngineer,
    /// Records attendance on the sites they are assigned to
    #[sea_orm(string_value = "SITE_ENGINEER")]
    SiteEngineer,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across the system
    #[sea_orm(unique)]
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email (may be empty)
    pub email: String,
    /// Contact phone (may be empty)
    pub phone: String,
    /// National identity number (may be empty)
    pub national_id: String,
    /// Role driving authorization
    pub role: Role,
    /// Superusers are treated as system admins regardless of role
    pub is_superuser: bool,
    /// Soft-disable flag; inactive users cannot act
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Display name used in notification texts.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Users are referenced by other tables but own no foreign keys themselves
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
