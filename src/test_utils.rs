//! Shared test utilities.
//!
//! This module provides an in-memory database and a small, fixed "world" of users,
//! sites and employees that most tests start from.

use crate::{
    core::access::Actor,
    entities::{Role, attendance, category, employee, site, site_engineer, user},
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::str::FromStr;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The date most tests book attendance on.
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap_or_default()
}

/// Inserts an active user directly, bypassing the permission checks of `core::user`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    role: Role,
    is_superuser: bool,
) -> Result<user::Model> {
    user::ActiveModel {
        username: Set(username.to_string()),
        first_name: Set(username.to_string()),
        last_name: Set(String::new()),
        email: Set(format!("{username}@example.com")),
        phone: Set(String::new()),
        national_id: Set(String::new()),
        role: Set(role),
        is_superuser: Set(is_superuser),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

async fn create_test_site(
    db: &DatabaseConnection,
    name: &str,
    chief: &user::Model,
    engineer: &user::Model,
) -> Result<site::Model> {
    let site = site::ActiveModel {
        name: Set(name.to_string()),
        location: Set("Kigali".to_string()),
        description: Set(String::new()),
        chief_engineer_id: Set(Some(chief.id)),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    site_engineer::ActiveModel {
        site_id: Set(site.id),
        user_id: Set(engineer.id),
    }
    .insert(db)
    .await?;
    Ok(site)
}

async fn create_test_employee(
    db: &DatabaseConnection,
    name: &str,
    site: &site::Model,
    category: &category::Model,
) -> Result<employee::Model> {
    employee::ActiveModel {
        full_name: Set(name.to_string()),
        national_id: Set(format!("ID-{name}")),
        contact: Set("0788000000".to_string()),
        site_id: Set(site.id),
        category_id: Set(Some(category.id)),
        is_active: Set(true),
        created_by: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// A populated database with two disjoint sites.
///
/// * `site_a` ("Site A"): chaired by `chief`, staffed by `engineer`, employs `employee_a`
/// * `site_b` ("Site B"): chaired by `other_chief`, staffed by `other_engineer`,
///   employs `employee_b`
pub struct World {
    /// Database connection
    pub db: DatabaseConnection,
    /// System admin
    pub admin: Actor,
    /// Chief of site A
    pub chief: Actor,
    /// Chief of site B
    pub other_chief: Actor,
    /// Engineer of site A
    pub engineer: Actor,
    /// Engineer of site B
    pub other_engineer: Actor,
    /// First site
    pub site_a: site::Model,
    /// Second site
    pub site_b: site::Model,
    /// Pay category ("Mason") used by both employees
    pub category: category::Model,
    /// Worker on site A
    pub employee_a: employee::Model,
    /// Worker on site B
    pub employee_b: employee::Model,
}

/// Sets up the standard [`World`].
pub async fn setup_world() -> Result<World> {
    let db = setup_test_db().await?;

    let admin = create_test_user(&db, "admin", Role::SystemAdmin, false).await?;
    let chief = create_test_user(&db, "chief", Role::ChiefEngineer, false).await?;
    let other_chief = create_test_user(&db, "other_chief", Role::ChiefEngineer, false).await?;
    let engineer = create_test_user(&db, "engineer", Role::SiteEngineer, false).await?;
    let other_engineer =
        create_test_user(&db, "other_engineer", Role::SiteEngineer, false).await?;

    let site_a = create_test_site(&db, "Site A", &chief, &engineer).await?;
    let site_b = create_test_site(&db, "Site B", &other_chief, &other_engineer).await?;

    let category = category::ActiveModel {
        name: Set("Mason".to_string()),
        description: Set(String::new()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    let employee_a = create_test_employee(&db, "Alice Mukamana", &site_a, &category).await?;
    let employee_b = create_test_employee(&db, "Bob Habimana", &site_b, &category).await?;

    Ok(World {
        db,
        admin: Actor::from(&admin),
        chief: Actor::from(&chief),
        other_chief: Actor::from(&other_chief),
        engineer: Actor::from(&engineer),
        other_engineer: Actor::from(&other_engineer),
        site_a,
        site_b,
        category,
        employee_a,
        employee_b,
    })
}

/// Creates a daily attendance record with no deductions or bonus.
///
/// # Arguments
/// * `amount` - Pay per day, as a decimal string (e.g. `"5000"`)
/// * `periods` - Number of days worked
pub async fn create_test_attendance(
    db: &DatabaseConnection,
    actor: &Actor,
    employee_id: i64,
    amount: &str,
    periods: i32,
    date: NaiveDate,
) -> Result<attendance::Model> {
    let amount = Decimal::from_str(amount)
        .map_err(|e| crate::errors::Error::validation(e.to_string()))?;
    attendance::ActiveModel {
        employee_id: Set(employee_id),
        category_id: Set(None),
        amount: Set(amount),
        period_type: Set(crate::entities::PeriodType::Daily),
        periods_worked: Set(periods),
        deducted: Set(Decimal::ZERO),
        bonus: Set(Decimal::ZERO),
        date: Set(date),
        signature: Set(false),
        created_by: Set(Some(actor.id)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
