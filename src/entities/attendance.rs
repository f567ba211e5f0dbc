//! Attendance record entity - One work period for one employee.
//!
//! `total_amount` is derived: it is recomputed from `amount`, `periods_worked`,
//! `deducted` and `bonus` in [`ActiveModelBehavior::before_save`], so every insert
//! and every update persists a consistent total. Unlike payroll, the total is not
//! clamped and may be negative.

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};

/// Unit of attendance measurement that multiplies the unit amount.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    /// Paid per day
    #[sea_orm(string_value = "DAILY")]
    Daily,
    /// Paid per week
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    /// Paid per two weeks
    #[sea_orm(string_value = "BIWEEKLY")]
    Biweekly,
    /// Paid per month
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
}

impl PeriodType {
    /// All period types in display order.
    pub const ALL: [Self; 4] = [Self::Daily, Self::Weekly, Self::Biweekly, Self::Monthly];

    /// Human-readable description of `n` periods, e.g. "3 day(s)".
    #[must_use]
    pub fn label(self, n: i32) -> String {
        let unit = match self {
            Self::Daily => "day",
            Self::Weekly => "week",
            Self::Biweekly => "bi-week",
            Self::Monthly => "month",
        };
        format!("{n} {unit}(s)")
    }
}

/// Attendance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Employee who worked
    pub employee_id: i64,
    /// Pay category the work was recorded under
    pub category_id: Option<i64>,
    /// Pay per period
    pub amount: Decimal,
    /// Unit of `periods_worked`
    pub period_type: PeriodType,
    /// Number of periods worked (at least one)
    pub periods_worked: i32,
    /// Deductions subtracted from the total
    pub deducted: Decimal,
    /// Bonus added to the total
    pub bonus: Decimal,
    /// `amount * periods_worked - deducted + bonus`
    pub total_amount: Decimal,
    /// Day the attendance is booked on
    pub date: Date,
    /// Whether the worker signed for the record
    pub signature: bool,
    /// User who recorded the attendance
    pub created_by: Option<i64>,
    /// When the record was created
    pub created_at: DateTimeUtc,
}

/// Computes the derived attendance total with exact decimal arithmetic.
#[must_use]
pub fn compute_total(
    amount: Decimal,
    periods_worked: i32,
    deducted: Decimal,
    bonus: Decimal,
) -> Decimal {
    amount * Decimal::from(periods_worked) - deducted + bonus
}

/// Defines relationships between attendance records and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record belongs to one employee
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
    /// Recording user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Creator,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

/// Reads a set or unchanged value; unset inputs count as their zero value.
fn current_or<V: Into<sea_orm::Value> + Clone>(value: &ActiveValue<V>, fallback: V) -> V {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => v.clone(),
        ActiveValue::NotSet => fallback,
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let total = compute_total(
            current_or(&self.amount, Decimal::ZERO),
            current_or(&self.periods_worked, 0),
            current_or(&self.deducted, Decimal::ZERO),
            current_or(&self.bonus, Decimal::ZERO),
        );
        self.total_amount = ActiveValue::Set(total);
        Ok(self)
    }
}
