//! Integration tests driving the HTTP router end to end.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::{Value, json};
use site_payroll::{
    api::{AppState, auth::USER_ID_HEADER, create_router},
    config::database::create_tables,
    entities::{Role, category, employee, site, site_engineer, user},
};
use tower::ServiceExt; // For `oneshot` method

struct Fixture {
    app: Router,
    admin: i64,
    chief: i64,
    engineer: i64,
    site_a: i64,
    category: i64,
    employee_a: i64,
    employee_b: i64,
}

async fn insert_user(db: &DatabaseConnection, username: &str, role: Role) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        first_name: Set(username.to_string()),
        last_name: Set(String::new()),
        email: Set(String::new()),
        phone: Set(String::new()),
        national_id: Set(String::new()),
        role: Set(role),
        is_superuser: Set(false),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

async fn insert_site(
    db: &DatabaseConnection,
    name: &str,
    chief: i64,
    engineer: i64,
) -> site::Model {
    let site = site::ActiveModel {
        name: Set(name.to_string()),
        location: Set(String::new()),
        description: Set(String::new()),
        chief_engineer_id: Set(Some(chief)),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    site_engineer::ActiveModel {
        site_id: Set(site.id),
        user_id: Set(engineer),
    }
    .insert(db)
    .await
    .unwrap();
    site
}

async fn insert_employee(
    db: &DatabaseConnection,
    name: &str,
    site_id: i64,
    category_id: i64,
) -> employee::Model {
    employee::ActiveModel {
        full_name: Set(name.to_string()),
        national_id: Set(format!("ID-{name}")),
        contact: Set(String::new()),
        site_id: Set(site_id),
        category_id: Set(Some(category_id)),
        is_active: Set(true),
        created_by: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Two sites, each with its own chief, engineer and employee.
async fn setup() -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    create_tables(&db).await.unwrap();

    let admin = insert_user(&db, "admin", Role::SystemAdmin).await;
    let chief = insert_user(&db, "chief", Role::ChiefEngineer).await;
    let other_chief = insert_user(&db, "other_chief", Role::ChiefEngineer).await;
    let engineer = insert_user(&db, "engineer", Role::SiteEngineer).await;
    let other_engineer = insert_user(&db, "other_engineer", Role::SiteEngineer).await;

    let site_a = insert_site(&db, "Site A", chief.id, engineer.id).await;
    let site_b = insert_site(&db, "Site B", other_chief.id, other_engineer.id).await;
    let category = category::ActiveModel {
        name: Set("Mason".to_string()),
        description: Set(String::new()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    let employee_a = insert_employee(&db, "Alice", site_a.id, category.id).await;
    let employee_b = insert_employee(&db, "Bob", site_b.id, category.id).await;

    Fixture {
        app: create_router(AppState::new(db)),
        admin: admin.id,
        chief: chief.id,
        engineer: engineer.id,
        site_a: site_a.id,
        category: category.id,
        employee_a: employee_a.id,
        employee_b: employee_b.id,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn get(app: &Router, uri: &str, user_id: i64) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("GET")
        .header(USER_ID_HEADER, user_id.to_string())
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn post(app: &Router, uri: &str, user_id: i64, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header(USER_ID_HEADER, user_id.to_string())
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap();
    send(app, request).await
}

fn decimal(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.as_f64().unwrap(),
    }
}

#[tokio::test]
async fn test_health() {
    let f = setup().await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&f.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_or_unknown_user_is_rejected() {
    let f = setup().await;

    let request = Request::builder()
        .uri("/employees/")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&f.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, _) = get(&f.app, "/employees/", 9999).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_attendance_to_payroll_flow() {
    let f = setup().await;

    let (status, body) = post(
        &f.app,
        "/attendance/create/",
        f.engineer,
        &json!({
            "employee_id": f.employee_a,
            "category_id": f.category,
            "amount": "5000",
            "period_type": "DAILY",
            "periods_worked": 3,
            "deducted": "0",
            "bonus": "500",
            "date": "Oct. 19, 2026"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Attendance recorded successfully");
    assert!((decimal(&body["data"]["total_amount"]) - 15500.0).abs() < f64::EPSILON);
    assert_eq!(body["data"]["date"], "2026-10-19");

    let (status, body) = post(
        &f.app,
        "/payroll/upsert/",
        f.engineer,
        &json!({ "employee_id": f.employee_a, "date": "2026-10-19", "payment_status": "PAID" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!((decimal(&body["data"]["total_paid"]) - 15500.0).abs() < f64::EPSILON);
    assert_eq!(body["data"]["payment_status"], "PAID");

    let (status, body) = get(&f.app, "/payroll/?date=2026-10-19", f.engineer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lines"].as_array().unwrap().len(), 1);

    let (status, body) = post(
        &f.app,
        "/payroll/submit/",
        f.engineer,
        &json!({ "date": "2026-10-19" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["notifications_sent"], 1);

    let (status, body) = get(&f.app, "/notifications/", f.chief).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unread"], 1);
    let submission = body["data"]["notifications"][0]["id"].as_i64().unwrap();

    let (status, body) = post(
        &f.app,
        &format!("/notifications/{submission}/reply/"),
        f.chief,
        &json!({ "message": "Approved" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["recipient_id"], f.engineer);
}

#[tokio::test]
async fn test_error_statuses() {
    let f = setup().await;

    let (status, body) = post(
        &f.app,
        "/payroll/upsert/",
        f.admin,
        &json!({ "employee_id": f.employee_a, "date": "2026-10-19" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "no_attendance");

    let (status, body) = post(&f.app, "/employees/999/toggle/", f.admin, &json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = post(
        &f.app,
        "/employees/categories/create/",
        f.engineer,
        &json!({ "name": "Mason" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn test_site_engineer_is_isolated() {
    let f = setup().await;

    let (status, body) = get(&f.app, "/employees/", f.engineer).await;
    assert_eq!(status, StatusCode::OK);
    let visible = body["data"].as_array().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["id"], f.employee_a);

    let (status, body) = post(
        &f.app,
        &format!("/employees/{}/delete/", f.employee_b),
        f.engineer,
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not_authorized");

    let (status, _) = get(&f.app, &format!("/employees/{}/json/", f.employee_b), f.engineer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = get(&f.app, "/users/", f.engineer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deactivated_user_is_locked_out() {
    let f = setup().await;

    let (status, body) = post(
        &f.app,
        &format!("/users/{}/deactivate/", f.engineer),
        f.chief,
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["is_active"], false);

    let (status, body) = get(&f.app, "/attendance/", f.engineer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "inactive_account");

    let (status, body) = get(&f.app, "/sites/", f.admin).await;
    assert_eq!(status, StatusCode::OK);
    let sites = body["data"].as_array().unwrap();
    assert_eq!(sites.len(), 2);
    assert!(sites.iter().any(|s| s["id"] == f.site_a));
}

#[tokio::test]
async fn test_malformed_body_renders_json_error() {
    let f = setup().await;

    let (status, body) = post(
        &f.app,
        "/payroll/upsert/",
        f.engineer,
        &json!({ "employee_id": f.employee_a, "date": "not a date" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation");
    assert!(body["message"].is_string());

    let (status, body) = post(
        &f.app,
        "/payroll/upsert/",
        f.engineer,
        &json!({ "date": "2026-10-19" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn test_site_engineer_edits_own_account() {
    let f = setup().await;

    let (status, body) = post(
        &f.app,
        "/account/edit/",
        f.engineer,
        &json!({
            "last_name": "Uwase",
            "national_id": "1199080000000000",
            "role": "SYSTEM_ADMIN"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["id"], f.engineer);
    assert_eq!(body["data"]["last_name"], "Uwase");
    assert_eq!(body["data"]["role"], "SITE_ENGINEER");

    let (status, body) = get(&f.app, "/account/", f.engineer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["national_id"], "1199080000000000");
}
