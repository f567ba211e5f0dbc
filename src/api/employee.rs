//! Employee and category routes.

use crate::{
    api::{
        AppState,
        body::JsonBody,
        response::{ApiResult, Outcome},
    },
    core::{
        access::Actor,
        category::{self, NewCategory},
        employee::{self, EmployeeDetail, EmployeeEarnings, EmployeeUpdate, NewEmployee},
    },
    entities::{CategoryModel, EmployeeModel},
};
use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};

/// Employee router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/employees/", get(list))
        .route("/employees/create/", post(create))
        .route("/employees/categories/", get(categories))
        .route("/employees/categories/create/", post(create_category))
        .route("/employees/{id}/edit/", post(edit))
        .route("/employees/{id}/toggle/", post(toggle))
        .route("/employees/{id}/delete/", post(delete))
        .route("/employees/{id}/json/", get(detail))
        .route("/employees/{id}/earnings/", get(earnings))
}

async fn list(State(state): State<AppState>, actor: Actor) -> ApiResult<Vec<EmployeeModel>> {
    let employees = employee::list_employees(&state.database, &actor).await?;
    Ok(Outcome::json(format!("{} employee(s)", employees.len()), employees))
}

async fn create(
    State(state): State<AppState>,
    actor: Actor,
    JsonBody(input): JsonBody<NewEmployee>,
) -> ApiResult<EmployeeModel> {
    let created = employee::create_employee(&state.database, &actor, input).await?;
    Ok(Outcome::json(
        format!("Employee {} registered successfully", created.full_name),
        created,
    ))
}

async fn edit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<EmployeeUpdate>,
) -> ApiResult<EmployeeModel> {
    let updated = employee::update_employee(&state.database, &actor, id, changes).await?;
    Ok(Outcome::json("Employee updated successfully", updated))
}

async fn toggle(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<EmployeeModel> {
    let updated = employee::toggle_employee_active(&state.database, &actor, id).await?;
    let verb = if updated.is_active { "activated" } else { "deactivated" };
    Ok(Outcome::json(format!("Employee {verb}"), updated))
}

async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<i64> {
    employee::delete_employee(&state.database, &actor, id).await?;
    Ok(Outcome::json("Employee deleted successfully", id))
}

/// GET /employees/{id}/json/ - detail used by form auto-fill
async fn detail(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<EmployeeDetail> {
    let detail = employee::employee_detail(&state.database, &actor, id).await?;
    Ok(Outcome::json("Employee detail", detail))
}

async fn earnings(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<EmployeeEarnings> {
    let earnings = employee::employee_earnings(&state.database, &actor, id).await?;
    Ok(Outcome::json("Employee earnings", earnings))
}

/// GET /employees/categories/ - any authenticated user
async fn categories(State(state): State<AppState>, _actor: Actor) -> ApiResult<Vec<CategoryModel>> {
    let categories = category::list_categories(&state.database).await?;
    Ok(Outcome::json(format!("{} categories", categories.len()), categories))
}

async fn create_category(
    State(state): State<AppState>,
    _actor: Actor,
    JsonBody(input): JsonBody<NewCategory>,
) -> ApiResult<CategoryModel> {
    let created = category::create_category(&state.database, input).await?;
    Ok(Outcome::json(
        format!("Category {} created successfully", created.name),
        created,
    ))
}
