//! Join table assigning site engineers to construction sites.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One (site, engineer) assignment
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "site_engineers")]
pub struct Model {
    /// Assigned site
    #[sea_orm(primary_key, auto_increment = false)]
    pub site_id: i64,
    /// Assigned engineer
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
}

/// Both sides cascade: removing a site or a user drops the assignment
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The site side of the assignment
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id",
        on_delete = "Cascade"
    )]
    Site,
    /// The engineer side of the assignment
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
