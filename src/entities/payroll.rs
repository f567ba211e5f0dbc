//! Payroll record entity - One payroll line per (employee, date).
//!
//! The line is derived from the same-day attendance sum. `total_paid` is recomputed
//! on every save as `max(0, amount - deducted + bonus)`.

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};

/// Payment state of a payroll line.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Fully paid
    #[sea_orm(string_value = "PAID")]
    Paid,
    /// Not yet paid
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Partially paid
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
}

/// Payroll database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payroll_records")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Paid employee; unique together with `date`
    pub employee_id: i64,
    /// Pay date
    pub date: Date,
    /// Employee category at the time of the last upsert
    pub category_id: Option<i64>,
    /// Sum of the employee's attendance totals for `date`
    pub amount: Decimal,
    /// Payroll-level deductions
    pub deducted: Decimal,
    /// Payroll-level bonus
    pub bonus: Decimal,
    /// `max(0, amount - deducted + bonus)`
    pub total_paid: Decimal,
    /// Contact captured at payment time
    pub contact: String,
    /// Whether the worker signed for payment; never cleared by an upsert
    pub signature: bool,
    /// Payment state
    pub payment_status: PaymentStatus,
    /// When the line was first created
    pub created_at: DateTimeUtc,
}

/// Computes the amount actually paid, clamped at zero.
#[must_use]
pub fn compute_total_paid(amount: Decimal, deducted: Decimal, bonus: Decimal) -> Decimal {
    (amount - deducted + bonus).max(Decimal::ZERO)
}

/// Defines relationships between payroll lines and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one employee
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
    /// Pay category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

fn current_or(value: &ActiveValue<Decimal>) -> Decimal {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => *v,
        ActiveValue::NotSet => Decimal::ZERO,
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let total = compute_total_paid(
            current_or(&self.amount),
            current_or(&self.deducted),
            current_or(&self.bonus),
        );
        self.total_paid = ActiveValue::Set(total);
        Ok(self)
    }
}
