//! Notification entity - Messages relayed between engineers and chiefs.
//!
//! Rows are only ever created as a side effect of payroll submission or reply;
//! afterwards only `is_read` changes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a notification is about.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// A site's payroll was submitted to its chief
    #[sea_orm(string_value = "PAYROLL_SUBMISSION")]
    PayrollSubmission,
    /// A chief answered a submission
    #[sea_orm(string_value = "PAYROLL_REPLY")]
    PayrollReply,
    /// Anything else
    #[sea_orm(string_value = "GENERAL")]
    General,
}

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User the notification is addressed to
    pub recipient_id: i64,
    /// User who triggered the notification
    pub sender_id: Option<i64>,
    /// Short title
    pub title: String,
    /// Body text
    pub message: String,
    /// Kind of notification
    pub notification_type: NotificationType,
    /// Payroll date the notification refers to
    pub related_date: Option<Date>,
    /// Site name the notification refers to (may be empty)
    pub related_site: String,
    /// Read flag, toggled by the recipient
    pub is_read: bool,
    /// When the notification was emitted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between notifications and users
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Addressee
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,
    /// Originator
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
}

impl ActiveModelBehavior for ActiveModel {}
