//! Notification routes.

use crate::{
    api::{
        AppState,
        body::JsonBody,
        response::{ApiResult, Outcome},
    },
    core::{access::Actor, notification},
    entities::NotificationModel,
};
use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

/// Notification router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications/", get(list))
        .route("/notifications/{id}/read/", post(mark_read))
        .route("/notifications/{id}/reply/", post(reply))
}

/// The actor's inbox.
#[derive(Debug, Serialize)]
pub struct Inbox {
    /// Unread notifications
    pub unread: u64,
    /// All notifications, newest first
    pub notifications: Vec<NotificationModel>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    message: String,
}

async fn list(State(state): State<AppState>, actor: Actor) -> ApiResult<Inbox> {
    let notifications = notification::list_notifications(&state.database, &actor).await?;
    let unread = notification::unread_count(&state.database, &actor).await?;
    Ok(Outcome::json(
        format!("{unread} unread notification(s)"),
        Inbox {
            unread,
            notifications,
        },
    ))
}

async fn mark_read(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<NotificationModel> {
    let read = notification::mark_read(&state.database, &actor, id).await?;
    Ok(Outcome::json("Notification marked as read", read))
}

/// POST /notifications/{id}/reply/ - chief answers a payroll submission
async fn reply(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    JsonBody(reply): JsonBody<Reply>,
) -> ApiResult<NotificationModel> {
    let sent = notification::reply_from_chief(&state.database, &actor, id, &reply.message).await?;
    Ok(Outcome::json("Reply sent", sent))
}
