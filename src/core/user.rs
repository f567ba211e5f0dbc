//! User management business logic.
//!
//! System admins manage every account and may assign any role. Chief engineers may
//! only create site engineers (optionally assigning them to sites they chair) and
//! manage the site engineers working on their sites.

use crate::{
    core::access::{Actor, ensure_user_access},
    entities::{
        Attendance, Employee, Notification, Role, Site, SiteEngineer, User, attendance, employee,
        notification, site, site_engineer, user,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Deserialize;
use tracing::info;

const fn default_true() -> bool {
    true
}

/// Input for [`create_user`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Unique login name
    pub username: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// Contact phone
    #[serde(default)]
    pub phone: String,
    /// National identity number
    #[serde(default)]
    pub national_id: String,
    /// Requested role; ignored for chief engineers, who can only create site engineers
    pub role: Option<Role>,
    /// Whether the account starts active
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Sites to assign a new site engineer to
    #[serde(default)]
    pub site_ids: Vec<i64>,
}

/// Partial update for [`update_user`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// National identity number
    pub national_id: Option<String>,
    /// New role (admins only)
    pub role: Option<Role>,
    /// Active flag
    pub is_active: Option<bool>,
}

/// The actor's own editable contact details; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// National identity number
    pub national_id: Option<String>,
}

/// Resolves the acting user for a request.
///
/// # Errors
/// [`Error::Unauthenticated`] if the id is unknown, [`Error::InactiveAccount`] if the
/// account has been deactivated.
pub async fn authenticate(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::Unauthenticated)?;
    if !user.is_active {
        return Err(Error::InactiveAccount { user_id });
    }
    Ok(user)
}

/// Finds a user by id.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Lists the accounts the actor may manage.
///
/// Admins see every account; chief engineers see all site engineers.
pub async fn list_users(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<user::Model>> {
    let query = if actor.is_admin() {
        User::find()
    } else if actor.is_chief() {
        User::find().filter(user::Column::Role.eq(Role::SiteEngineer))
    } else {
        return Err(Error::not_authorized("list users"));
    };
    query
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates an account, optionally assigning a new site engineer to sites.
///
/// Site assignments requested by a chief are silently narrowed to the sites that
/// chief chairs.
pub async fn create_user(
    db: &DatabaseConnection,
    actor: &Actor,
    input: NewUser,
) -> Result<user::Model> {
    if !actor.is_admin() && !actor.is_chief() {
        return Err(Error::not_authorized("create users"));
    }

    let username = input.username.trim().to_string();
    if username.is_empty() {
        return Err(Error::validation("Username is required"));
    }

    let role = if actor.is_admin() {
        input.role.unwrap_or(Role::SiteEngineer)
    } else {
        Role::SiteEngineer
    };

    let txn = db.begin().await?;

    let taken = User::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(&txn)
        .await?
        .is_some();
    if taken {
        return Err(Error::validation(
            "Username already exists. Please choose another.",
        ));
    }

    let created = user::ActiveModel {
        username: Set(username),
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        email: Set(input.email),
        phone: Set(input.phone),
        national_id: Set(input.national_id),
        role: Set(role),
        is_superuser: Set(false),
        is_active: Set(input.is_active),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if role == Role::SiteEngineer && !input.site_ids.is_empty() {
        let mut sites = Site::find().filter(site::Column::Id.is_in(input.site_ids));
        if actor.is_chief() {
            sites = sites.filter(site::Column::ChiefEngineerId.eq(actor.id));
        }
        for site in sites.all(&txn).await? {
            site_engineer::ActiveModel {
                site_id: Set(site.id),
                user_id: Set(created.id),
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    info!(user_id = created.id, role = ?role, by = actor.id, "User created");
    Ok(created)
}

/// Updates a managed account. Chief engineers can only ever set the site engineer role.
pub async fn update_user(
    db: &DatabaseConnection,
    actor: &Actor,
    user_id: i64,
    changes: UserUpdate,
) -> Result<user::Model> {
    let target = ensure_user_access(db, actor, user_id, "edit this user").await?;
    let mut model: user::ActiveModel = target.into();

    if let Some(first_name) = changes.first_name {
        model.first_name = Set(first_name);
    }
    if let Some(last_name) = changes.last_name {
        model.last_name = Set(last_name);
    }
    if let Some(email) = changes.email {
        model.email = Set(email);
    }
    if let Some(phone) = changes.phone {
        model.phone = Set(phone);
    }
    if let Some(national_id) = changes.national_id {
        model.national_id = Set(national_id);
    }
    if actor.is_admin() {
        if let Some(role) = changes.role {
            model.role = Set(role);
        }
    } else {
        model.role = Set(Role::SiteEngineer);
    }
    if let Some(is_active) = changes.is_active {
        model.is_active = Set(is_active);
    }

    model.update(db).await.map_err(Into::into)
}

/// Updates the actor's own profile. Role and active flag are never touched.
pub async fn update_own_profile(
    db: &DatabaseConnection,
    actor: &Actor,
    changes: ProfileUpdate,
) -> Result<user::Model> {
    let current = User::find_by_id(actor.id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "user",
            id: actor.id,
        })?;
    let mut model: user::ActiveModel = current.into();

    if let Some(first_name) = changes.first_name {
        model.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = changes.last_name {
        model.last_name = Set(last_name.trim().to_string());
    }
    if let Some(email) = changes.email {
        model.email = Set(email.trim().to_string());
    }
    if let Some(phone) = changes.phone {
        model.phone = Set(phone.trim().to_string());
    }
    if let Some(national_id) = changes.national_id {
        model.national_id = Set(national_id.trim().to_string());
    }

    let updated = model.update(db).await?;
    info!(user_id = updated.id, "Profile updated");
    Ok(updated)
}

/// Activates or deactivates a managed account.
pub async fn set_user_active(
    db: &DatabaseConnection,
    actor: &Actor,
    user_id: i64,
    active: bool,
) -> Result<user::Model> {
    let action = if active {
        "activate this user"
    } else {
        "deactivate this user"
    };
    let target = ensure_user_access(db, actor, user_id, action).await?;
    let mut model: user::ActiveModel = target.into();
    model.is_active = Set(active);
    model.update(db).await.map_err(Into::into)
}

/// Deletes a managed account.
///
/// References held by other rows are cleared (creator fields, chief of a site) and
/// the user's site assignments and notifications are removed.
pub async fn delete_user(db: &DatabaseConnection, actor: &Actor, user_id: i64) -> Result<()> {
    let target = ensure_user_access(db, actor, user_id, "delete this user").await?;

    let txn = db.begin().await?;

    SiteEngineer::delete_many()
        .filter(site_engineer::Column::UserId.eq(target.id))
        .exec(&txn)
        .await?;
    Notification::delete_many()
        .filter(
            notification::Column::RecipientId
                .eq(target.id)
                .or(notification::Column::SenderId.eq(target.id)),
        )
        .exec(&txn)
        .await?;
    Site::update_many()
        .col_expr(
            site::Column::ChiefEngineerId,
            Expr::value(Option::<i64>::None),
        )
        .filter(site::Column::ChiefEngineerId.eq(target.id))
        .exec(&txn)
        .await?;
    Employee::update_many()
        .col_expr(employee::Column::CreatedBy, Expr::value(Option::<i64>::None))
        .filter(employee::Column::CreatedBy.eq(target.id))
        .exec(&txn)
        .await?;
    Attendance::update_many()
        .col_expr(
            attendance::Column::CreatedBy,
            Expr::value(Option::<i64>::None),
        )
        .filter(attendance::Column::CreatedBy.eq(target.id))
        .exec(&txn)
        .await?;
    target.delete(&txn).await?;

    txn.commit().await?;
    info!(user_id, by = actor.id, "User deleted");
    Ok(())
}
