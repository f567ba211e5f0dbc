//! Employee registry business logic.
//!
//! Employees belong to exactly one site. Registering, editing, toggling and deleting a
//! worker all require write access to the worker's site; moving a worker also requires
//! access to the destination site.

use crate::{
    core::{
        access::{Actor, ensure_employee_access, ensure_site_access, visible_scope},
        category::require_category,
    },
    entities::{
        Attendance, Category, Employee, Payroll, PeriodType, Site, attendance, employee, payroll,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Input for [`create_employee`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    /// Full name
    pub full_name: String,
    /// National identity number
    pub national_id: String,
    /// Phone or other contact
    #[serde(default)]
    pub contact: String,
    /// Site the worker joins
    pub site_id: i64,
    /// Pay category
    pub category_id: Option<i64>,
}

/// Partial update for [`update_employee`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeUpdate {
    /// Full name
    pub full_name: Option<String>,
    /// National identity number
    pub national_id: Option<String>,
    /// Phone or other contact
    pub contact: Option<String>,
    /// Destination site when moving the worker
    pub site_id: Option<i64>,
    /// New pay category
    pub category_id: Option<i64>,
}

/// Read-only view of a worker used by form auto-fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeDetail {
    /// Employee id
    pub id: i64,
    /// Full name
    pub full_name: String,
    /// National identity number
    pub national_id: String,
    /// Contact
    pub contact: String,
    /// Category name, if any
    pub category: Option<String>,
    /// Site name
    pub site: Option<String>,
    /// Active flag
    pub is_active: bool,
}

/// Attendance count and earnings for one period type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodEarnings {
    /// Period type
    pub period_type: PeriodType,
    /// Number of attendance records of this type
    pub records: usize,
    /// Sum of their totals
    pub earnings: Decimal,
}

/// Earnings of one worker across all attendance records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeEarnings {
    /// Employee id
    pub employee_id: i64,
    /// Breakdown per period type, always all four types
    pub by_period: Vec<PeriodEarnings>,
    /// Sum over all records
    pub total: Decimal,
}

fn require_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Finds an employee by id, failing with [`Error::NotFound`] if it does not exist.
pub async fn require_employee<C: ConnectionTrait>(db: &C, id: i64) -> Result<employee::Model> {
    Employee::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "employee",
            id,
        })
}

/// Loads an employee the actor may see; invisible workers are reported as not authorized.
pub async fn require_visible_employee<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    id: i64,
) -> Result<employee::Model> {
    let employee = require_employee(db, id).await?;
    if visible_scope(db, actor).await?.allows_site(employee.site_id) {
        Ok(employee)
    } else {
        Err(Error::not_authorized("view this employee"))
    }
}

/// Lists the workers visible to the actor.
pub async fn list_employees(
    db: &DatabaseConnection,
    actor: &Actor,
) -> Result<Vec<employee::Model>> {
    let scope = visible_scope(db, actor).await?;
    Employee::find()
        .filter(scope.employee_condition())
        .order_by_asc(employee::Column::FullName)
        .order_by_asc(employee::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Inserts a worker after the caller has checked access to `site_id`.
pub(crate) async fn insert_employee<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: NewEmployee,
) -> Result<employee::Model> {
    let full_name = require_text(&input.full_name, "Full name")?;
    let national_id = require_text(&input.national_id, "National ID")?;

    employee::ActiveModel {
        full_name: Set(full_name),
        national_id: Set(national_id),
        contact: Set(input.contact.trim().to_string()),
        site_id: Set(input.site_id),
        category_id: Set(input.category_id),
        is_active: Set(true),
        created_by: Set(Some(actor.id)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Registers a worker on a site the actor may write to.
pub async fn create_employee(
    db: &DatabaseConnection,
    actor: &Actor,
    input: NewEmployee,
) -> Result<employee::Model> {
    ensure_site_access(db, actor, input.site_id, "add employees to this site").await?;
    if let Some(category_id) = input.category_id {
        require_category(db, category_id).await?;
    }

    let employee = insert_employee(db, actor, input).await?;
    info!(
        employee_id = employee.id,
        site_id = employee.site_id,
        by = actor.id,
        "Employee registered"
    );
    Ok(employee)
}

/// Edits a worker, optionally moving them to another site.
pub async fn update_employee(
    db: &DatabaseConnection,
    actor: &Actor,
    employee_id: i64,
    changes: EmployeeUpdate,
) -> Result<employee::Model> {
    let employee = require_employee(db, employee_id).await?;
    ensure_employee_access(db, actor, &employee, "update this employee").await?;

    let mut model: employee::ActiveModel = employee.clone().into();
    if let Some(full_name) = changes.full_name {
        model.full_name = Set(require_text(&full_name, "Full name")?);
    }
    if let Some(national_id) = changes.national_id {
        model.national_id = Set(require_text(&national_id, "National ID")?);
    }
    if let Some(contact) = changes.contact {
        model.contact = Set(contact.trim().to_string());
    }
    if let Some(site_id) = changes.site_id {
        if site_id != employee.site_id {
            ensure_site_access(db, actor, site_id, "move employees to this site").await?;
        }
        model.site_id = Set(site_id);
    }
    if let Some(category_id) = changes.category_id {
        require_category(db, category_id).await?;
        model.category_id = Set(Some(category_id));
    }

    model.update(db).await.map_err(Into::into)
}

/// Flips a worker's active flag.
pub async fn toggle_employee_active(
    db: &DatabaseConnection,
    actor: &Actor,
    employee_id: i64,
) -> Result<employee::Model> {
    let employee = require_employee(db, employee_id).await?;
    ensure_employee_access(db, actor, &employee, "update this employee").await?;

    let active = employee.is_active;
    let mut model: employee::ActiveModel = employee.into();
    model.is_active = Set(!active);
    model.update(db).await.map_err(Into::into)
}

/// Deletes a worker together with their attendance and payroll.
pub async fn delete_employee(
    db: &DatabaseConnection,
    actor: &Actor,
    employee_id: i64,
) -> Result<()> {
    let employee = require_employee(db, employee_id).await?;
    ensure_employee_access(db, actor, &employee, "delete this employee").await?;

    let txn = db.begin().await?;
    Payroll::delete_many()
        .filter(payroll::Column::EmployeeId.eq(employee.id))
        .exec(&txn)
        .await?;
    Attendance::delete_many()
        .filter(attendance::Column::EmployeeId.eq(employee.id))
        .exec(&txn)
        .await?;
    employee.delete(&txn).await?;
    txn.commit().await?;

    info!(employee_id, by = actor.id, "Employee deleted");
    Ok(())
}

/// Read-only detail of a visible worker.
pub async fn employee_detail(
    db: &DatabaseConnection,
    actor: &Actor,
    employee_id: i64,
) -> Result<EmployeeDetail> {
    let employee = require_visible_employee(db, actor, employee_id).await?;

    let category = match employee.category_id {
        Some(id) => Category::find_by_id(id).one(db).await?.map(|c| c.name),
        None => None,
    };
    let site = Site::find_by_id(employee.site_id)
        .one(db)
        .await?
        .map(|s| s.name);

    Ok(EmployeeDetail {
        id: employee.id,
        full_name: employee.full_name,
        national_id: employee.national_id,
        contact: employee.contact,
        category,
        site,
        is_active: employee.is_active,
    })
}

/// Record counts and earnings of a visible worker, broken down by period type.
pub async fn employee_earnings(
    db: &DatabaseConnection,
    actor: &Actor,
    employee_id: i64,
) -> Result<EmployeeEarnings> {
    let employee = require_visible_employee(db, actor, employee_id).await?;
    let records = Attendance::find()
        .filter(attendance::Column::EmployeeId.eq(employee.id))
        .all(db)
        .await?;

    let by_period: Vec<PeriodEarnings> = PeriodType::ALL
        .iter()
        .map(|period_type| {
            let matching = records.iter().filter(|r| r.period_type == *period_type);
            PeriodEarnings {
                period_type: *period_type,
                records: matching.clone().count(),
                earnings: matching.map(|r| r.total_amount).sum(),
            }
        })
        .collect();
    let total = by_period.iter().map(|p| p.earnings).sum();

    Ok(EmployeeEarnings {
        employee_id: employee.id,
        by_period,
        total,
    })
}
