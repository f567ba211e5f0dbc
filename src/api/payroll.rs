//! Payroll routes, including submission to chief engineers.

use crate::{
    api::{
        AppState,
        body::JsonBody,
        response::{ApiResult, Outcome},
    },
    core::{
        access::Actor,
        dates::{deserialize_date, parse_date_or_today, today},
        notification::{self, SubmissionOutcome},
        payroll::{
            self, BulkOutcome, BulkPayrollRequest, PayrollAdjustment, PayrollDay, PayrollRequest,
            PayrollRow,
        },
    },
    entities::{PaymentStatus, PayrollModel},
};
use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

/// Payroll router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payroll/", get(day_view))
        .route("/payroll/records/", get(records))
        .route("/payroll/upsert/", post(upsert))
        .route("/payroll/bulk/", post(bulk))
        .route("/payroll/submit/", post(submit))
        .route("/payroll/{id}/status/", post(status))
        .route("/payroll/{id}/sign/", post(sign))
        .route("/payroll/{id}/adjust/", post(adjust))
        .route("/payroll/{id}/delete/", post(delete))
}

/// Query string of the payroll day view
#[derive(Debug, Deserialize)]
struct DayQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    payment_status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
struct Submission {
    #[serde(deserialize_with = "deserialize_date")]
    date: NaiveDate,
}

/// GET /payroll/?date= - the day's attendance per employee; unreadable dates mean today
async fn day_view(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<DayQuery>,
) -> ApiResult<PayrollDay> {
    let date = parse_date_or_today(query.date.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Unreadable payroll date, showing today");
        today()
    });
    let day = payroll::payroll_day_view(&state.database, &actor, date).await?;
    Ok(Outcome::json(format!("Payroll for {date}"), day))
}

/// GET /payroll/records/
async fn records(State(state): State<AppState>, actor: Actor) -> ApiResult<Vec<PayrollRow>> {
    let rows = payroll::list_payroll(&state.database, &actor).await?;
    Ok(Outcome::json(format!("{} payroll record(s)", rows.len()), rows))
}

/// POST /payroll/upsert/
async fn upsert(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(request): JsonBody<PayrollRequest>,
) -> ApiResult<PayrollModel> {
    let line = payroll::upsert_payroll(&state.database, &actor, request).await?;
    Ok(Outcome::json("Payroll saved successfully", line))
}

/// POST /payroll/bulk/
async fn bulk(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(request): JsonBody<BulkPayrollRequest>,
) -> ApiResult<BulkOutcome> {
    let outcome = payroll::bulk_upsert_payroll(&state.database, &actor, request).await?;
    Ok(Outcome::json(
        format!("Updated {} payroll record(s)", outcome.updated),
        outcome,
    ))
}

/// POST /payroll/submit/ - notify the chief of each site
async fn submit(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(submission): JsonBody<Submission>,
) -> ApiResult<SubmissionOutcome> {
    let outcome =
        notification::submit_payroll_to_chief(&state.database, &actor, submission.date).await?;
    Ok(Outcome::json(
        format!(
            "Payroll submitted to {} chief engineer(s)",
            outcome.notifications_sent
        ),
        outcome,
    ))
}

/// POST /payroll/{id}/status/
async fn status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    JsonBody(change): JsonBody<StatusChange>,
) -> ApiResult<PayrollModel> {
    let line =
        payroll::update_payroll_status(&state.database, &actor, id, change.payment_status).await?;
    Ok(Outcome::json("Payment status updated", line))
}

/// POST /payroll/{id}/sign/
async fn sign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<PayrollModel> {
    let line = payroll::sign_payroll(&state.database, &actor, id).await?;
    Ok(Outcome::json("Payroll signed", line))
}

/// POST /payroll/{id}/adjust/
async fn adjust(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    JsonBody(adjustment): JsonBody<PayrollAdjustment>,
) -> ApiResult<PayrollModel> {
    let line = payroll::adjust_payroll(&state.database, &actor, id, adjustment).await?;
    Ok(Outcome::json("Payroll adjusted", line))
}

/// POST /payroll/{id}/delete/
async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<i64> {
    payroll::delete_payroll(&state.database, &actor, id).await?;
    Ok(Outcome::json("Payroll deleted successfully", id))
}
