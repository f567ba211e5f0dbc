//! Attendance routes.

use crate::{
    api::{
        AppState,
        body::JsonBody,
        response::{ApiResult, Outcome},
    },
    core::{
        access::Actor,
        attendance::{
            self, AttendanceRow, AttendanceUpdate, LatestAttendance, NewAttendance, PeriodSummary,
        },
    },
    entities::AttendanceModel,
};
use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};

/// Attendance router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attendance/", get(list))
        .route("/attendance/summary/", get(summary))
        .route("/attendance/create/", post(create))
        .route("/attendance/{id}/edit/", post(edit))
        .route("/attendance/{id}/delete/", post(delete))
        .route("/attendance/{employee_id}/latest/json/", get(latest))
}

/// GET /attendance/ - visible records, newest first
async fn list(State(state): State<AppState>, actor: Actor) -> ApiResult<Vec<AttendanceRow>> {
    let rows = attendance::list_attendance(&state.database, &actor).await?;
    Ok(Outcome::json(format!("{} attendance record(s)", rows.len()), rows))
}

/// GET /attendance/summary/ - totals per period type
async fn summary(State(state): State<AppState>, actor: Actor) -> ApiResult<Vec<PeriodSummary>> {
    let summary = attendance::attendance_summary(&state.database, &actor).await?;
    Ok(Outcome::json("Attendance summary", summary))
}

/// POST /attendance/create/
async fn create(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(input): JsonBody<NewAttendance>,
) -> ApiResult<AttendanceModel> {
    let record = attendance::create_attendance(&state.database, &actor, input).await?;
    Ok(Outcome::json("Attendance recorded successfully", record))
}

/// POST /attendance/{id}/edit/
async fn edit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<AttendanceUpdate>,
) -> ApiResult<AttendanceModel> {
    let record = attendance::update_attendance(&state.database, &actor, id, changes).await?;
    Ok(Outcome::json("Attendance updated successfully", record))
}

/// POST /attendance/{id}/delete/
async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<i64> {
    attendance::delete_attendance(&state.database, &actor, id).await?;
    Ok(Outcome::json("Attendance deleted successfully", id))
}

/// GET /attendance/{employee_id}/latest/json/ - pre-fill values for the next record
async fn latest(
    State(state): State<AppState>,
    actor: Actor,
    Path(employee_id): Path<i64>,
) -> ApiResult<LatestAttendance> {
    let latest = attendance::latest_attendance(&state.database, &actor, employee_id).await?;
    Ok(Outcome::json("Latest attendance", latest))
}
