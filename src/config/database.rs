//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL. The only
//! extra DDL is the unique (employee, date) index that makes payroll upserts idempotent.

use crate::entities::{
    Attendance, Category, Employee, Notification, Payroll, Site, SiteEngineer, User, payroll,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/workforce.sqlite?mode=rwc";

/// Name of the unique index over `payroll_records(employee_id, date)`.
pub const PAYROLL_UNIQUE_INDEX: &str = "idx_payroll_employee_date";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file (created on first use) if no environment
/// variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    info!(url = %database_url, "Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Directory holding the `SQLite` file of a `sqlite://` URL, if it has one.
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (if missing) from the entity definitions.
///
/// Parents are created before children so the generated foreign keys always
/// reference an existing table. Safe to call on every start-up.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Site).await?;
    create_table(db, &schema, SiteEngineer).await?;
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Employee).await?;
    create_table(db, &schema, Attendance).await?;
    create_table(db, &schema, Payroll).await?;
    create_table(db, &schema, Notification).await?;

    let unique_payroll = Index::create()
        .if_not_exists()
        .name(PAYROLL_UNIQUE_INDEX)
        .table(Payroll)
        .col(payroll::Column::EmployeeId)
        .col(payroll::Column::Date)
        .unique()
        .to_owned();
    db.execute(builder.build(&unique_payroll)).await?;

    Ok(())
}
