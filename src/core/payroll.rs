//! Payroll aggregation business logic.
//!
//! A payroll line is keyed by (employee, date). Its `amount` is always the fresh sum of
//! the employee's attendance totals for that date; deductions and bonus are kept across
//! re-aggregation and `total_paid` is clamped at zero by the entity on every save.

use crate::{
    core::{
        access::{Actor, ensure_employee_access, visible_scope},
        attendance::{day_total, visible_day},
        dates::deserialize_date,
        employee::require_employee,
    },
    entities::{Employee, PaymentStatus, Payroll, employee, payroll},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Input for [`upsert_payroll`].
#[derive(Debug, Clone, Deserialize)]
pub struct PayrollRequest {
    /// Employee to pay
    pub employee_id: i64,
    /// Pay date
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    /// Desired payment state
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Whether the worker signed; a signed line stays signed
    #[serde(default)]
    pub signature: bool,
}

/// One employee of a bulk request.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkEntry {
    /// Employee to pay
    pub employee_id: i64,
    /// Desired payment state
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Whether the worker signed
    #[serde(default)]
    pub signature: bool,
}

/// Input for [`bulk_upsert_payroll`].
#[derive(Debug, Clone, Deserialize)]
pub struct BulkPayrollRequest {
    /// Pay date shared by every entry
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    /// Employees to pay
    pub entries: Vec<BulkEntry>,
}

/// Result of a bulk upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Lines created or refreshed
    pub updated: usize,
    /// Entries skipped as unknown, not authorized or without attendance
    pub skipped: usize,
}

/// Input for [`adjust_payroll`].
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PayrollAdjustment {
    /// Payroll-level deductions
    pub deducted: Decimal,
    /// Payroll-level bonus
    pub bonus: Decimal,
}

/// One employee's attendance on the payroll day, with their payroll line if any.
#[derive(Debug, Clone, Serialize)]
pub struct PayrollDayLine {
    /// Employee id
    pub employee_id: i64,
    /// Employee full name
    pub employee_name: String,
    /// Employee contact
    pub contact: String,
    /// Employee category
    pub category_id: Option<i64>,
    /// Number of attendance records that day
    pub records: usize,
    /// Sum of attendance totals
    pub total: Decimal,
    /// Sum of attendance deductions
    pub deducted: Decimal,
    /// Sum of attendance bonuses
    pub bonus: Decimal,
    /// Existing payroll line
    pub payroll: Option<payroll::Model>,
}

/// The payroll day: date plus one line per employee with attendance.
#[derive(Debug, Clone, Serialize)]
pub struct PayrollDay {
    /// Payroll date
    pub date: NaiveDate,
    /// Per-employee lines, ordered by employee id
    pub lines: Vec<PayrollDayLine>,
    /// Sum of all attendance totals
    pub grand_total: Decimal,
}

/// A payroll line with its employee name, as listed.
#[derive(Debug, Clone, Serialize)]
pub struct PayrollRow {
    /// The line
    #[serde(flatten)]
    pub record: payroll::Model,
    /// Employee full name
    pub employee_name: String,
}

/// Finds a payroll line by id.
pub async fn require_payroll<C: ConnectionTrait>(db: &C, id: i64) -> Result<payroll::Model> {
    Payroll::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "payroll record",
            id,
        })
}

/// Finds the line for (employee, date).
pub async fn find_line<C: ConnectionTrait>(
    db: &C,
    employee_id: i64,
    date: NaiveDate,
) -> Result<Option<payroll::Model>> {
    Payroll::find()
        .filter(payroll::Column::EmployeeId.eq(employee_id))
        .filter(payroll::Column::Date.eq(date))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn upsert_line<C: ConnectionTrait>(
    db: &C,
    employee: &employee::Model,
    date: NaiveDate,
    payment_status: PaymentStatus,
    signature: bool,
) -> Result<payroll::Model> {
    let amount = day_total(db, employee.id, date)
        .await?
        .ok_or(Error::NoAttendance {
            employee_id: Some(employee.id),
            date,
        })?;

    match find_line(db, employee.id, date).await? {
        Some(existing) => {
            let signed = existing.signature || signature;
            let mut model: payroll::ActiveModel = existing.into();
            model.amount = Set(amount);
            model.category_id = Set(employee.category_id);
            model.payment_status = Set(payment_status);
            model.signature = Set(signed);
            model.update(db).await.map_err(Into::into)
        }
        None => payroll::ActiveModel {
            employee_id: Set(employee.id),
            date: Set(date),
            category_id: Set(employee.category_id),
            amount: Set(amount),
            deducted: Set(Decimal::ZERO),
            bonus: Set(Decimal::ZERO),
            contact: Set(employee.contact.clone()),
            signature: Set(signature),
            payment_status: Set(payment_status),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(Into::into),
    }
}

/// Creates or refreshes the payroll line of one employee from that day's attendance.
#[instrument(skip(db, request), fields(employee_id = request.employee_id, date = %request.date))]
pub async fn upsert_payroll(
    db: &DatabaseConnection,
    actor: &Actor,
    request: PayrollRequest,
) -> Result<payroll::Model> {
    let txn = db.begin().await?;
    let employee = require_employee(&txn, request.employee_id).await?;
    ensure_employee_access(&txn, actor, &employee, "process payroll for this employee").await?;

    let line = upsert_line(
        &txn,
        &employee,
        request.date,
        request.payment_status,
        request.signature,
    )
    .await?;
    txn.commit().await?;

    info!(payroll_id = line.id, total_paid = %line.total_paid, "Payroll line saved");
    Ok(line)
}

/// Upserts the payroll of several employees for one date.
///
/// Entries that are unknown, not authorized or without attendance are skipped; any
/// other failure aborts the remaining entries.
pub async fn bulk_upsert_payroll(
    db: &DatabaseConnection,
    actor: &Actor,
    request: BulkPayrollRequest,
) -> Result<BulkOutcome> {
    let mut outcome = BulkOutcome {
        updated: 0,
        skipped: 0,
    };

    for entry in request.entries {
        let single = PayrollRequest {
            employee_id: entry.employee_id,
            date: request.date,
            payment_status: entry.payment_status,
            signature: entry.signature,
        };
        match upsert_payroll(db, actor, single).await {
            Ok(_) => outcome.updated += 1,
            Err(
                e @ (Error::NotFound { .. }
                | Error::NotAuthorized { .. }
                | Error::NoAttendance { .. }),
            ) => {
                warn!(employee_id = entry.employee_id, error = %e, "Skipping payroll entry");
                outcome.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        date = %request.date,
        updated = outcome.updated,
        skipped = outcome.skipped,
        by = actor.id,
        "Bulk payroll processed"
    );
    Ok(outcome)
}

/// Visible attendance of `date` grouped per employee, with existing payroll lines.
pub async fn payroll_day_view(
    db: &DatabaseConnection,
    actor: &Actor,
    date: NaiveDate,
) -> Result<PayrollDay> {
    let rows = visible_day(db, actor, date).await?;

    let mut grouped: BTreeMap<i64, PayrollDayLine> = BTreeMap::new();
    for (record, employee) in rows {
        let line = grouped.entry(employee.id).or_insert_with(|| PayrollDayLine {
            employee_id: employee.id,
            employee_name: employee.full_name.clone(),
            contact: employee.contact.clone(),
            category_id: employee.category_id,
            records: 0,
            total: Decimal::ZERO,
            deducted: Decimal::ZERO,
            bonus: Decimal::ZERO,
            payroll: None,
        });
        line.records += 1;
        line.total += record.total_amount;
        line.deducted += record.deducted;
        line.bonus += record.bonus;
    }

    let existing = Payroll::find()
        .filter(payroll::Column::Date.eq(date))
        .filter(payroll::Column::EmployeeId.is_in(grouped.keys().copied().collect::<Vec<_>>()))
        .all(db)
        .await?;
    for line in existing {
        if let Some(day_line) = grouped.get_mut(&line.employee_id) {
            day_line.payroll = Some(line);
        }
    }

    let lines: Vec<PayrollDayLine> = grouped.into_values().collect();
    let grand_total = lines.iter().map(|l| l.total).sum();
    Ok(PayrollDay {
        date,
        lines,
        grand_total,
    })
}

/// Lists the visible payroll lines, newest date first.
pub async fn list_payroll(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<PayrollRow>> {
    let scope = visible_scope(db, actor).await?;
    let rows = Payroll::find()
        .filter(scope.employee_owned_condition(payroll::Column::EmployeeId))
        .find_also_related(Employee)
        .order_by_desc(payroll::Column::Date)
        .order_by_desc(payroll::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(record, employee)| PayrollRow {
            employee_name: employee.map(|e| e.full_name).unwrap_or_default(),
            record,
        })
        .collect())
}

async fn load_writable(
    db: &DatabaseConnection,
    actor: &Actor,
    payroll_id: i64,
    action: &str,
) -> Result<payroll::Model> {
    let line = require_payroll(db, payroll_id).await?;
    let employee = require_employee(db, line.employee_id).await?;
    ensure_employee_access(db, actor, &employee, action).await?;
    Ok(line)
}

/// Sets the payment state of a line.
pub async fn update_payroll_status(
    db: &DatabaseConnection,
    actor: &Actor,
    payroll_id: i64,
    status: PaymentStatus,
) -> Result<payroll::Model> {
    let line = load_writable(db, actor, payroll_id, "update this payroll record").await?;
    let mut model: payroll::ActiveModel = line.into();
    model.payment_status = Set(status);
    model.update(db).await.map_err(Into::into)
}

/// Marks a line as signed by the worker.
pub async fn sign_payroll(
    db: &DatabaseConnection,
    actor: &Actor,
    payroll_id: i64,
) -> Result<payroll::Model> {
    let line = load_writable(db, actor, payroll_id, "sign this payroll record").await?;
    let mut model: payroll::ActiveModel = line.into();
    model.signature = Set(true);
    model.update(db).await.map_err(Into::into)
}

/// Edits payroll-level deductions and bonus; the paid total is re-clamped on save.
pub async fn adjust_payroll(
    db: &DatabaseConnection,
    actor: &Actor,
    payroll_id: i64,
    adjustment: PayrollAdjustment,
) -> Result<payroll::Model> {
    if adjustment.deducted.is_sign_negative() || adjustment.bonus.is_sign_negative() {
        return Err(Error::validation(
            "Deductions and bonus must not be negative",
        ));
    }
    let line = load_writable(db, actor, payroll_id, "adjust this payroll record").await?;
    let mut model: payroll::ActiveModel = line.into();
    model.deducted = Set(adjustment.deducted);
    model.bonus = Set(adjustment.bonus);
    let updated = model.update(db).await?;

    info!(payroll_id, total_paid = %updated.total_paid, by = actor.id, "Payroll adjusted");
    Ok(updated)
}

/// Deletes a payroll line.
pub async fn delete_payroll(db: &DatabaseConnection, actor: &Actor, payroll_id: i64) -> Result<()> {
    let line = load_writable(db, actor, payroll_id, "delete this payroll record").await?;
    line.delete(db).await?;
    info!(payroll_id, by = actor.id, "Payroll deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::attendance::{AttendanceUpdate, update_attendance},
        entities::attendance,
        test_utils::*,
    };
    use rust_decimal_macros::dec;

    fn request(employee_id: i64) -> PayrollRequest {
        PayrollRequest {
            employee_id,
            date: test_date(),
            payment_status: PaymentStatus::Pending,
            signature: false,
        }
    }

    #[tokio::test]
    async fn test_payroll_sums_attendance() -> Result<()> {
        let w = setup_world().await?;
        let record =
            create_test_attendance(&w.db, &w.admin, w.employee_a.id, "5000", 3, test_date())
                .await?;
        let mut model: attendance::ActiveModel = record.into();
        model.bonus = Set(dec!(500));
        model.update(&w.db).await?;

        let line = upsert_payroll(&w.db, &w.engineer, request(w.employee_a.id)).await?;
        assert_eq!(line.amount, dec!(15500));
        assert_eq!(line.total_paid, dec!(15500));
        assert_eq!(line.deducted, Decimal::ZERO);
        assert_eq!(line.category_id, w.employee_a.category_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_no_attendance_creates_nothing() -> Result<()> {
        let w = setup_world().await?;
        let result = upsert_payroll(&w.db, &w.admin, request(w.employee_a.id)).await;
        assert!(matches!(
            result,
            Err(Error::NoAttendance {
                employee_id: Some(_),
                ..
            })
        ));
        assert_eq!(Payroll::find().count(&w.db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_twice_keeps_one_row() -> Result<()> {
        let w = setup_world().await?;
        let record =
            create_test_attendance(&w.db, &w.admin, w.employee_a.id, "1000", 1, test_date())
                .await?;

        let mut signed = request(w.employee_a.id);
        signed.signature = true;
        let first = upsert_payroll(&w.db, &w.admin, signed).await?;
        adjust_payroll(
            &w.db,
            &w.admin,
            first.id,
            PayrollAdjustment {
                deducted: dec!(100),
                bonus: Decimal::ZERO,
            },
        )
        .await?;

        let changes = AttendanceUpdate {
            employee_id: record.employee_id,
            category_id: w.category.id,
            periods_worked: 2,
            amount: None,
            period_type: None,
            deducted: None,
            bonus: None,
            date: None,
            signature: None,
        };
        update_attendance(&w.db, &w.admin, record.id, changes).await?;

        let mut paid = request(w.employee_a.id);
        paid.payment_status = PaymentStatus::Paid;
        let second = upsert_payroll(&w.db, &w.admin, paid).await?;

        assert_eq!(second.id, first.id);
        assert_eq!(Payroll::find().count(&w.db).await?, 1);
        assert_eq!(second.amount, dec!(2000));
        assert_eq!(second.deducted, dec!(100));
        assert_eq!(second.total_paid, dec!(1900));
        assert!(second.signature);
        assert_eq!(second.payment_status, PaymentStatus::Paid);
        Ok(())
    }

    #[tokio::test]
    async fn test_total_paid_never_negative() -> Result<()> {
        let w = setup_world().await?;
        create_test_attendance(&w.db, &w.admin, w.employee_a.id, "100", 1, test_date()).await?;
        let line = upsert_payroll(&w.db, &w.admin, request(w.employee_a.id)).await?;

        let adjusted = adjust_payroll(
            &w.db,
            &w.admin,
            line.id,
            PayrollAdjustment {
                deducted: dec!(500),
                bonus: dec!(50),
            },
        )
        .await?;
        assert_eq!(adjusted.total_paid, Decimal::ZERO);

        let negative = adjust_payroll(
            &w.db,
            &w.admin,
            line.id,
            PayrollAdjustment {
                deducted: dec!(-1),
                bonus: Decimal::ZERO,
            },
        )
        .await;
        assert!(matches!(negative, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_skips_unauthorized() -> Result<()> {
        let w = setup_world().await?;
        create_test_attendance(&w.db, &w.admin, w.employee_a.id, "300", 1, test_date()).await?;
        create_test_attendance(&w.db, &w.admin, w.employee_b.id, "400", 1, test_date()).await?;

        let outcome = bulk_upsert_payroll(
            &w.db,
            &w.engineer,
            BulkPayrollRequest {
                date: test_date(),
                entries: vec![
                    BulkEntry {
                        employee_id: w.employee_a.id,
                        payment_status: PaymentStatus::Paid,
                        signature: true,
                    },
                    BulkEntry {
                        employee_id: w.employee_b.id,
                        payment_status: PaymentStatus::Paid,
                        signature: true,
                    },
                    BulkEntry {
                        employee_id: 9999,
                        payment_status: PaymentStatus::Paid,
                        signature: false,
                    },
                ],
            },
        )
        .await?;

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.skipped, 2);
        assert!(find_line(&w.db, w.employee_a.id, test_date()).await?.is_some());
        assert!(find_line(&w.db, w.employee_b.id, test_date()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_day_view_groups_per_employee() -> Result<()> {
        let w = setup_world().await?;
        create_test_attendance(&w.db, &w.admin, w.employee_a.id, "5000", 3, test_date()).await?;
        create_test_attendance(&w.db, &w.admin, w.employee_a.id, "250", 2, test_date()).await?;
        create_test_attendance(&w.db, &w.admin, w.employee_b.id, "400", 1, test_date()).await?;
        upsert_payroll(&w.db, &w.admin, request(w.employee_a.id)).await?;

        let day = payroll_day_view(&w.db, &w.engineer, test_date()).await?;
        assert_eq!(day.lines.len(), 1);
        let line = &day.lines[0];
        assert_eq!(line.employee_id, w.employee_a.id);
        assert_eq!(line.records, 2);
        assert_eq!(line.total, dec!(15500));
        assert!(line.payroll.is_some());
        assert_eq!(day.grand_total, dec!(15500));

        let admin_day = payroll_day_view(&w.db, &w.admin, test_date()).await?;
        assert_eq!(admin_day.lines.len(), 2);
        assert!(admin_day.lines[1].payroll.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_status_sign_and_delete() -> Result<()> {
        let w = setup_world().await?;
        create_test_attendance(&w.db, &w.admin, w.employee_b.id, "400", 1, test_date()).await?;
        let line = upsert_payroll(&w.db, &w.admin, request(w.employee_b.id)).await?;

        let denied = sign_payroll(&w.db, &w.engineer, line.id).await;
        assert!(matches!(denied, Err(Error::NotAuthorized { .. })));

        let partial =
            update_payroll_status(&w.db, &w.other_engineer, line.id, PaymentStatus::Partial)
                .await?;
        assert_eq!(partial.payment_status, PaymentStatus::Partial);
        let signed = sign_payroll(&w.db, &w.other_engineer, line.id).await?;
        assert!(signed.signature);

        assert!(list_payroll(&w.db, &w.engineer).await?.is_empty());
        let rows = list_payroll(&w.db, &w.other_engineer).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_name, w.employee_b.full_name);

        delete_payroll(&w.db, &w.other_engineer, line.id).await?;
        assert!(matches!(
            require_payroll(&w.db, line.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
