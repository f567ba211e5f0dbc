//! Construction site routes.

use crate::{
    api::{
        AppState,
        body::JsonBody,
        response::{ApiResult, Outcome},
    },
    core::{
        access::Actor,
        site::{self, NewSite, SiteSummary, SiteUpdate},
    },
    entities::SiteModel,
};
use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Deserialize;

/// Site router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sites/", get(list))
        .route("/sites/create/", post(create))
        .route("/sites/{id}/edit/", post(edit))
        .route("/sites/{id}/assign/", post(assign))
        .route("/sites/{id}/delete/", post(delete))
}

#[derive(Debug, Deserialize)]
struct Assignment {
    #[serde(default)]
    engineer_ids: Vec<i64>,
}

async fn list(State(state): State<AppState>, actor: Actor) -> ApiResult<Vec<SiteSummary>> {
    let sites = site::list_sites(&state.database, &actor).await?;
    Ok(Outcome::json(format!("{} site(s)", sites.len()), sites))
}

async fn create(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(input): JsonBody<NewSite>,
) -> ApiResult<SiteModel> {
    let created = site::create_site(&state.database, &actor, input).await?;
    Ok(Outcome::json(
        format!("Site {} created successfully", created.name),
        created,
    ))
}

async fn edit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<SiteUpdate>,
) -> ApiResult<SiteModel> {
    let updated = site::update_site(&state.database, &actor, id, changes).await?;
    Ok(Outcome::json("Site updated successfully", updated))
}

/// POST /sites/{id}/assign/ - replaces the engineer set
async fn assign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    JsonBody(assignment): JsonBody<Assignment>,
) -> ApiResult<Vec<i64>> {
    let assigned =
        site::assign_engineers(&state.database, &actor, id, assignment.engineer_ids).await?;
    Ok(Outcome::json(
        format!("{} engineer(s) assigned", assigned.len()),
        assigned,
    ))
}

async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<i64> {
    site::delete_site(&state.database, &actor, id).await?;
    Ok(Outcome::json("Site deleted successfully", id))
}
