//! User account routes.

use crate::{
    api::{
        AppState,
        body::JsonBody,
        response::{ApiResult, Outcome},
    },
    core::{
        access::Actor,
        user::{self, NewUser, ProfileUpdate, UserUpdate},
    },
    entities::UserModel,
    errors::Error,
};
use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};

/// User router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list))
        .route("/users/create/", post(create))
        .route("/users/{id}/edit/", post(edit))
        .route("/users/{id}/activate/", post(activate))
        .route("/users/{id}/deactivate/", post(deactivate))
        .route("/users/{id}/delete/", post(delete))
        .route("/account/", get(account))
        .route("/account/edit/", post(edit_account))
}

async fn account(State(state): State<AppState>, actor: Actor) -> ApiResult<UserModel> {
    let me = user::get_user(&state.database, actor.id)
        .await?
        .ok_or(Error::NotFound {
            entity: "user",
            id: actor.id,
        })?;
    Ok(Outcome::json(format!("Profile of {}", me.display_name()), me))
}

async fn edit_account(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(changes): JsonBody<ProfileUpdate>,
) -> ApiResult<UserModel> {
    let updated = user::update_own_profile(&state.database, &actor, changes).await?;
    Ok(Outcome::json("Profile updated successfully", updated))
}

async fn list(State(state): State<AppState>, actor: Actor) -> ApiResult<Vec<UserModel>> {
    let users = user::list_users(&state.database, &actor).await?;
    Ok(Outcome::json(format!("{} user(s)", users.len()), users))
}

async fn create(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(input): JsonBody<NewUser>,
) -> ApiResult<UserModel> {
    let created = user::create_user(&state.database, &actor, input).await?;
    Ok(Outcome::json(
        format!("User {} created successfully", created.username),
        created,
    ))
}

async fn edit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<UserUpdate>,
) -> ApiResult<UserModel> {
    let updated = user::update_user(&state.database, &actor, id, changes).await?;
    Ok(Outcome::json("User updated successfully", updated))
}

async fn activate(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<UserModel> {
    let updated = user::set_user_active(&state.database, &actor, id, true).await?;
    Ok(Outcome::json(
        format!("User {} activated", updated.display_name()),
        updated,
    ))
}

async fn deactivate(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<UserModel> {
    let updated = user::set_user_active(&state.database, &actor, id, false).await?;
    Ok(Outcome::json(
        format!("User {} deactivated", updated.display_name()),
        updated,
    ))
}

async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<i64> {
    user::delete_user(&state.database, &actor, id).await?;
    Ok(Outcome::json("User deleted successfully", id))
}
