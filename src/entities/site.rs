//! Construction site entity.
//!
//! Each site has at most one chief engineer and any number of assigned site
//! engineers (stored in the `site_engineers` join table).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Construction site database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "construction_sites")]
pub struct Model {
    /// Unique identifier for the site
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Site name
    pub name: String,
    /// Free-form location
    pub location: String,
    /// Free-form description
    pub description: String,
    /// Chief engineer in charge of the site, if any
    pub chief_engineer_id: Option<i64>,
    /// Soft-disable flag
    pub is_active: bool,
    /// When the site was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between sites and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The chief engineer; cleared when that user is deleted
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ChiefEngineerId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    ChiefEngineer,
    /// One site employs many workers
    #[sea_orm(has_many = "super::employee::Entity")]
    Employees,
    /// Engineer assignments
    #[sea_orm(has_many = "super::site_engineer::Entity")]
    SiteEngineers,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl Related<super::site_engineer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SiteEngineers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
