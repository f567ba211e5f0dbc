//! Access scoping - decides which rows an actor may see and change.
//!
//! Every listing goes through [`visible_scope`], which resolves the actor's role into a
//! [`Scope`]: either unrestricted (system admins and superusers) or the set of site ids
//! the actor is attached to. Chief engineers are attached to the sites they chair; site
//! engineers to the sites they are assigned to. The same rule backs the per-row write
//! checks, so a row is writable exactly when it is visible.

use crate::{
    entities::{Role, Site, SiteEngineer, User, employee, site, site_engineer, user},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, PaginatorTrait, QuerySelect, QueryTrait, prelude::*, sea_query::SelectStatement,
};
use serde::Serialize;

/// The explicit authorization context of one request: who is acting, in which role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    /// Id of the acting user
    pub id: i64,
    /// Role of the acting user
    pub role: Role,
    /// Superusers are admins whatever their role says
    pub is_superuser: bool,
}

impl Actor {
    /// Creates an actor from its parts.
    #[must_use]
    pub const fn new(id: i64, role: Role, is_superuser: bool) -> Self {
        Self {
            id,
            role,
            is_superuser,
        }
    }

    /// System admins and superusers.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_superuser || matches!(self.role, Role::SystemAdmin)
    }

    /// Chief engineers that are not also superusers.
    #[must_use]
    pub const fn is_chief(&self) -> bool {
        !self.is_admin() && matches!(self.role, Role::ChiefEngineer)
    }

    /// Site engineers that are not also superusers.
    #[must_use]
    pub const fn is_site_engineer(&self) -> bool {
        !self.is_admin() && matches!(self.role, Role::SiteEngineer)
    }
}

impl From<&user::Model> for Actor {
    fn from(user: &user::Model) -> Self {
        Self::new(user.id, user.role, user.is_superuser)
    }
}

/// The rows an actor may see, expressed as the sites they are attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// No restriction
    Unrestricted,
    /// Only rows belonging to these sites
    Sites(Vec<i64>),
}

impl Scope {
    /// Whether rows of `site_id` fall inside the scope.
    #[must_use]
    pub fn allows_site(&self, site_id: i64) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Sites(ids) => ids.contains(&site_id),
        }
    }

    /// Filter for the `construction_sites` table.
    #[must_use]
    pub fn site_condition(&self) -> Condition {
        match self {
            Self::Unrestricted => Condition::all(),
            Self::Sites(ids) => Condition::all().add(site::Column::Id.is_in(ids.clone())),
        }
    }

    /// Filter for the `employees` table.
    #[must_use]
    pub fn employee_condition(&self) -> Condition {
        match self {
            Self::Unrestricted => Condition::all(),
            Self::Sites(ids) => Condition::all().add(employee::Column::SiteId.is_in(ids.clone())),
        }
    }

    /// Filter for any table keyed by `employee_id` (attendance, payroll).
    #[must_use]
    pub fn employee_owned_condition<C: ColumnTrait>(&self, employee_column: C) -> Condition {
        match self {
            Self::Unrestricted => Condition::all(),
            Self::Sites(ids) => {
                Condition::all().add(employee_column.in_subquery(employees_of_sites(ids)))
            }
        }
    }
}

fn employees_of_sites(site_ids: &[i64]) -> SelectStatement {
    crate::entities::Employee::find()
        .select_only()
        .column(employee::Column::Id)
        .filter(employee::Column::SiteId.is_in(site_ids.to_vec()))
        .into_query()
}

async fn chaired_site_ids<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Vec<i64>> {
    Site::find()
        .select_only()
        .column(site::Column::Id)
        .filter(site::Column::ChiefEngineerId.eq(user_id))
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(Into::into)
}

async fn assigned_site_ids<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Vec<i64>> {
    SiteEngineer::find()
        .select_only()
        .column(site_engineer::Column::SiteId)
        .filter(site_engineer::Column::UserId.eq(user_id))
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves which employee-owned rows (employees, attendance, payroll) the actor may see.
pub async fn visible_scope<C: ConnectionTrait>(db: &C, actor: &Actor) -> Result<Scope> {
    if actor.is_admin() {
        return Ok(Scope::Unrestricted);
    }
    match actor.role {
        Role::ChiefEngineer => Ok(Scope::Sites(chaired_site_ids(db, actor.id).await?)),
        Role::SiteEngineer => Ok(Scope::Sites(assigned_site_ids(db, actor.id).await?)),
        Role::SystemAdmin => Ok(Scope::Unrestricted),
    }
}

/// Resolves which sites appear in the site listing.
///
/// Chief engineers see every site (they pick chiefs and staff across the company);
/// site engineers only the sites they are assigned to.
pub async fn site_listing_scope<C: ConnectionTrait>(db: &C, actor: &Actor) -> Result<Scope> {
    if actor.is_admin() || actor.is_chief() {
        return Ok(Scope::Unrestricted);
    }
    Ok(Scope::Sites(assigned_site_ids(db, actor.id).await?))
}

/// Whether the actor may change rows that belong to `site`.
pub async fn can_write_site<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    site: &site::Model,
) -> Result<bool> {
    if actor.is_admin() {
        return Ok(true);
    }
    match actor.role {
        Role::ChiefEngineer => Ok(site.chief_engineer_id == Some(actor.id)),
        Role::SiteEngineer => {
            let assignments = SiteEngineer::find()
                .filter(site_engineer::Column::SiteId.eq(site.id))
                .filter(site_engineer::Column::UserId.eq(actor.id))
                .count(db)
                .await?;
            Ok(assignments > 0)
        }
        Role::SystemAdmin => Ok(true),
    }
}

/// Loads a site and fails unless the actor may change its rows.
pub async fn ensure_site_access<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    site_id: i64,
    action: &str,
) -> Result<site::Model> {
    let site = Site::find_by_id(site_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "site",
            id: site_id,
        })?;
    if can_write_site(db, actor, &site).await? {
        Ok(site)
    } else {
        Err(Error::not_authorized(action))
    }
}

/// Fails unless the actor may change rows of the employee's site.
pub async fn ensure_employee_access<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    employee: &employee::Model,
    action: &str,
) -> Result<()> {
    ensure_site_access(db, actor, employee.site_id, action)
        .await
        .map(|_| ())
}

/// Whether the actor may edit, (de)activate or delete the `target` account.
///
/// Admins manage everyone. A chief engineer manages a site engineer only if that
/// engineer is assigned to at least one site the chief chairs.
pub async fn can_manage_user<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    target: &user::Model,
) -> Result<bool> {
    if actor.is_admin() {
        return Ok(true);
    }
    if !actor.is_chief() || target.role != Role::SiteEngineer {
        return Ok(false);
    }
    let chaired = chaired_site_ids(db, actor.id).await?;
    let shared = SiteEngineer::find()
        .filter(site_engineer::Column::UserId.eq(target.id))
        .filter(site_engineer::Column::SiteId.is_in(chaired))
        .count(db)
        .await?;
    Ok(shared > 0)
}

/// Loads a user and fails unless the actor may manage them.
pub async fn ensure_user_access<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    user_id: i64,
    action: &str,
) -> Result<user::Model> {
    let target = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "user",
            id: user_id,
        })?;
    if can_manage_user(db, actor, &target).await? {
        Ok(target)
    } else {
        Err(Error::not_authorized(action))
    }
}
