//! Attendance ledger business logic.
//!
//! Each record books `periods_worked` periods of work at `amount` per period for one
//! employee on one date. The derived total is recomputed by the entity on every save,
//! so this module never writes `total_amount` itself.

use crate::{
    core::{
        access::{Actor, ensure_employee_access, ensure_site_access, visible_scope},
        category::require_category,
        dates::{deserialize_optional_date, today},
        employee::{NewEmployee, insert_employee, require_employee, require_visible_employee},
    },
    entities::{Attendance, Employee, PeriodType, attendance, employee},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Worker registered on the fly together with their first attendance record.
#[derive(Debug, Clone, Deserialize)]
pub struct InlineEmployee {
    /// Full name
    pub full_name: String,
    /// National identity number
    pub national_id: String,
    /// Contact, optional
    #[serde(default)]
    pub contact: String,
    /// Site the worker joins
    pub site_id: i64,
}

/// Input for [`create_attendance`].
///
/// Exactly one of `employee_id` and `new_employee` must be given.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttendance {
    /// Existing employee
    pub employee_id: Option<i64>,
    /// Worker to register along with the record
    pub new_employee: Option<InlineEmployee>,
    /// Pay category
    pub category_id: i64,
    /// Pay per period
    pub amount: Decimal,
    /// Unit of `periods_worked`
    #[serde(default = "default_period_type")]
    pub period_type: PeriodType,
    /// Defaults to one period
    pub periods_worked: Option<i32>,
    /// Deductions
    #[serde(default)]
    pub deducted: Decimal,
    /// Bonus
    #[serde(default)]
    pub bonus: Decimal,
    /// Defaults to today
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
    /// Whether the worker signed
    #[serde(default)]
    pub signature: bool,
}

/// Input for [`update_attendance`].
///
/// Employee, category and periods are required; the remaining fields keep their
/// current value when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceUpdate {
    /// Employee the record belongs to
    pub employee_id: i64,
    /// Pay category
    pub category_id: i64,
    /// Number of periods
    pub periods_worked: i32,
    /// Pay per period
    pub amount: Option<Decimal>,
    /// Unit of `periods_worked`
    pub period_type: Option<PeriodType>,
    /// Deductions
    pub deducted: Option<Decimal>,
    /// Bonus
    pub bonus: Option<Decimal>,
    /// Booking date
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
    /// Whether the worker signed
    pub signature: Option<bool>,
}

const fn default_period_type() -> PeriodType {
    PeriodType::Daily
}

/// An attendance record with the name of its employee, as listed.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRow {
    /// The record
    #[serde(flatten)]
    pub record: attendance::Model,
    /// Employee full name
    pub employee_name: String,
    /// Human-readable periods, e.g. "3 day(s)"
    pub period_label: String,
}

/// Aggregate of the visible records of one period type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodSummary {
    /// Period type
    pub period_type: PeriodType,
    /// Number of records
    pub count: usize,
    /// Sum of `total_amount`
    pub total: Decimal,
    /// Sum of `periods_worked`
    pub periods: i64,
}

/// Values used to pre-fill a new attendance form from an employee's last record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestAttendance {
    /// Pay per period
    pub amount: Decimal,
    /// Deductions
    pub deducted: Decimal,
    /// Bonus
    pub bonus: Decimal,
    /// Derived total
    pub total_amount: Decimal,
    /// Unit
    pub period_type: PeriodType,
    /// Number of periods
    pub periods_worked: i32,
    /// Booking date
    pub date: NaiveDate,
    /// Pay category
    pub category_id: Option<i64>,
}

fn validate_amounts(
    amount: Decimal,
    periods_worked: i32,
    deducted: Decimal,
    bonus: Decimal,
) -> Result<()> {
    if periods_worked < 1 {
        return Err(Error::validation("Periods worked must be at least 1"));
    }
    if amount.is_sign_negative() || deducted.is_sign_negative() || bonus.is_sign_negative() {
        return Err(Error::validation(
            "Amount, deductions and bonus must not be negative",
        ));
    }
    Ok(())
}

/// Finds an attendance record by id.
pub async fn require_attendance<C: ConnectionTrait>(db: &C, id: i64) -> Result<attendance::Model> {
    Attendance::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "attendance record",
            id,
        })
}

/// Records attendance, registering the worker first when `new_employee` is given.
pub async fn create_attendance(
    db: &DatabaseConnection,
    actor: &Actor,
    input: NewAttendance,
) -> Result<attendance::Model> {
    let periods_worked = input.periods_worked.unwrap_or(1);
    validate_amounts(input.amount, periods_worked, input.deducted, input.bonus)?;
    require_category(db, input.category_id).await?;

    let txn = db.begin().await?;

    let employee = match (input.employee_id, input.new_employee) {
        (Some(employee_id), None) => {
            let employee = require_employee(&txn, employee_id).await?;
            ensure_employee_access(&txn, actor, &employee, "record attendance for this employee")
                .await?;
            employee
        }
        (None, Some(new)) => {
            ensure_site_access(&txn, actor, new.site_id, "add employees to this site").await?;
            let employee = insert_employee(
                &txn,
                actor,
                NewEmployee {
                    full_name: new.full_name,
                    national_id: new.national_id,
                    contact: new.contact,
                    site_id: new.site_id,
                    category_id: Some(input.category_id),
                },
            )
            .await?;
            debug!(employee_id = employee.id, "Employee registered with attendance");
            employee
        }
        (Some(_), Some(_)) => {
            return Err(Error::validation(
                "Choose an existing employee or register a new one, not both",
            ));
        }
        (None, None) => return Err(Error::validation("An employee is required")),
    };

    let record = attendance::ActiveModel {
        employee_id: Set(employee.id),
        category_id: Set(Some(input.category_id)),
        amount: Set(input.amount),
        period_type: Set(input.period_type),
        periods_worked: Set(periods_worked),
        deducted: Set(input.deducted),
        bonus: Set(input.bonus),
        date: Set(input.date.unwrap_or_else(today)),
        signature: Set(input.signature),
        created_by: Set(Some(actor.id)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        attendance_id = record.id,
        employee_id = employee.id,
        total = %record.total_amount,
        by = actor.id,
        "Attendance recorded"
    );
    Ok(record)
}

/// Edits an attendance record; the total is recomputed on save.
pub async fn update_attendance(
    db: &DatabaseConnection,
    actor: &Actor,
    attendance_id: i64,
    changes: AttendanceUpdate,
) -> Result<attendance::Model> {
    let record = require_attendance(db, attendance_id).await?;
    let current_employee = require_employee(db, record.employee_id).await?;
    ensure_employee_access(db, actor, &current_employee, "edit this attendance record").await?;

    if changes.employee_id != record.employee_id {
        let target = require_employee(db, changes.employee_id).await?;
        ensure_employee_access(db, actor, &target, "move attendance to this employee").await?;
    }
    require_category(db, changes.category_id).await?;

    let amount = changes.amount.unwrap_or(record.amount);
    let deducted = changes.deducted.unwrap_or(record.deducted);
    let bonus = changes.bonus.unwrap_or(record.bonus);
    validate_amounts(amount, changes.periods_worked, deducted, bonus)?;

    let mut model: attendance::ActiveModel = record.clone().into();
    model.employee_id = Set(changes.employee_id);
    model.category_id = Set(Some(changes.category_id));
    model.periods_worked = Set(changes.periods_worked);
    model.amount = Set(amount);
    model.deducted = Set(deducted);
    model.bonus = Set(bonus);
    if let Some(period_type) = changes.period_type {
        model.period_type = Set(period_type);
    }
    if let Some(date) = changes.date {
        model.date = Set(date);
    }
    if let Some(signature) = changes.signature {
        model.signature = Set(signature);
    }

    let updated = model.update(db).await?;
    info!(attendance_id, total = %updated.total_amount, by = actor.id, "Attendance updated");
    Ok(updated)
}

/// Deletes an attendance record.
pub async fn delete_attendance(
    db: &DatabaseConnection,
    actor: &Actor,
    attendance_id: i64,
) -> Result<()> {
    let record = require_attendance(db, attendance_id).await?;
    let employee = require_employee(db, record.employee_id).await?;
    ensure_employee_access(db, actor, &employee, "delete this attendance record").await?;

    record.delete(db).await?;
    info!(attendance_id, by = actor.id, "Attendance deleted");
    Ok(())
}

/// Lists the visible attendance, newest first.
pub async fn list_attendance(
    db: &DatabaseConnection,
    actor: &Actor,
) -> Result<Vec<AttendanceRow>> {
    let scope = visible_scope(db, actor).await?;
    let rows = Attendance::find()
        .filter(scope.employee_owned_condition(attendance::Column::EmployeeId))
        .find_also_related(Employee)
        .order_by_desc(attendance::Column::Date)
        .order_by_desc(attendance::Column::CreatedAt)
        .order_by_desc(attendance::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(record, employee)| AttendanceRow {
            period_label: record.period_type.label(record.periods_worked),
            employee_name: employee.map(|e| e.full_name).unwrap_or_default(),
            record,
        })
        .collect())
}

/// Visible attendance grouped by period type; all four types are always present.
pub async fn attendance_summary(
    db: &DatabaseConnection,
    actor: &Actor,
) -> Result<Vec<PeriodSummary>> {
    let scope = visible_scope(db, actor).await?;
    let records = Attendance::find()
        .filter(scope.employee_owned_condition(attendance::Column::EmployeeId))
        .all(db)
        .await?;

    Ok(PeriodType::ALL
        .iter()
        .map(|period_type| {
            let of_type: Vec<&attendance::Model> = records
                .iter()
                .filter(|r| r.period_type == *period_type)
                .collect();
            PeriodSummary {
                period_type: *period_type,
                count: of_type.len(),
                total: of_type.iter().map(|r| r.total_amount).sum(),
                periods: of_type.iter().map(|r| i64::from(r.periods_worked)).sum(),
            }
        })
        .collect())
}

/// The employee's most recent attendance, for pre-filling the next record.
pub async fn latest_attendance(
    db: &DatabaseConnection,
    actor: &Actor,
    employee_id: i64,
) -> Result<LatestAttendance> {
    let employee = require_visible_employee(db, actor, employee_id).await?;
    let record = Attendance::find()
        .filter(attendance::Column::EmployeeId.eq(employee.id))
        .order_by_desc(attendance::Column::Date)
        .order_by_desc(attendance::Column::CreatedAt)
        .order_by_desc(attendance::Column::Id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "attendance for employee",
            id: employee_id,
        })?;

    Ok(LatestAttendance {
        amount: record.amount,
        deducted: record.deducted,
        bonus: record.bonus,
        total_amount: record.total_amount,
        period_type: record.period_type,
        periods_worked: record.periods_worked,
        date: record.date,
        category_id: record.category_id,
    })
}

/// Sum of an employee's attendance totals on `date`, `None` when there is none.
pub async fn day_total<C: ConnectionTrait>(
    db: &C,
    employee_id: i64,
    date: NaiveDate,
) -> Result<Option<Decimal>> {
    let records = Attendance::find()
        .filter(attendance::Column::EmployeeId.eq(employee_id))
        .filter(attendance::Column::Date.eq(date))
        .all(db)
        .await?;
    if records.is_empty() {
        return Ok(None);
    }
    Ok(Some(records.iter().map(|r| r.total_amount).sum()))
}

/// Visible attendance booked on `date`, joined with employees.
pub(crate) async fn visible_day<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    date: NaiveDate,
) -> Result<Vec<(attendance::Model, employee::Model)>> {
    let scope = visible_scope(db, actor).await?;
    let rows = Attendance::find()
        .filter(scope.employee_owned_condition(attendance::Column::EmployeeId))
        .filter(attendance::Column::Date.eq(date))
        .find_also_related(Employee)
        .order_by_asc(attendance::Column::EmployeeId)
        .order_by_asc(attendance::Column::Id)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(record, employee)| employee.map(|e| (record, e)))
        .collect())
}
