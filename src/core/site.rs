//! Construction site business logic.
//!
//! Admins and chief engineers register sites. A chief may only edit, staff or delete
//! the sites they chair; admins may act on every site.

use crate::{
    core::access::{Actor, site_listing_scope},
    entities::{
        Attendance, Employee, Payroll, Role, Site, SiteEngineer, User, attendance, employee,
        payroll, site, site_engineer, user,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Input for [`create_site`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSite {
    /// Site name
    pub name: String,
    /// Free-form location
    #[serde(default)]
    pub location: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Chief engineer in charge, must hold the chief engineer role
    pub chief_engineer_id: Option<i64>,
}

/// Partial update for [`update_site`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteUpdate {
    /// Site name
    pub name: Option<String>,
    /// Free-form location
    pub location: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// New chief engineer
    pub chief_engineer_id: Option<i64>,
    /// Active flag
    pub is_active: Option<bool>,
}

/// A site together with its assigned engineers, as shown in the site listing.
#[derive(Debug, Clone, Serialize)]
pub struct SiteSummary {
    /// The site itself
    #[serde(flatten)]
    pub site: site::Model,
    /// Ids of the assigned site engineers
    pub engineer_ids: Vec<i64>,
}

/// Finds a site by id.
pub async fn get_site(db: &DatabaseConnection, site_id: i64) -> Result<Option<site::Model>> {
    Site::find_by_id(site_id).one(db).await.map_err(Into::into)
}

/// Ids of the engineers assigned to a site, ascending.
pub async fn engineer_ids<C: ConnectionTrait>(db: &C, site_id: i64) -> Result<Vec<i64>> {
    SiteEngineer::find()
        .select_only()
        .column(site_engineer::Column::UserId)
        .filter(site_engineer::Column::SiteId.eq(site_id))
        .order_by_asc(site_engineer::Column::UserId)
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(Into::into)
}

async fn ensure_chief_role<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<()> {
    let user = User::find_by_id(user_id).one(db).await?;
    match user {
        Some(user) if user.role == Role::ChiefEngineer => Ok(()),
        _ => Err(Error::validation(format!(
            "User {user_id} is not a chief engineer"
        ))),
    }
}

fn ensure_can_register(actor: &Actor) -> Result<()> {
    if actor.is_admin() || actor.is_chief() {
        Ok(())
    } else {
        Err(Error::not_authorized("manage sites"))
    }
}

async fn load_own_site<C: ConnectionTrait>(
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
    if actor.is_admin() || (actor.is_chief() && site.chief_engineer_id == Some(actor.id)) {
        Ok(site)
    } else {
        Err(Error::not_authorized(action))
    }
}

/// Lists sites visible to the actor, with their engineers.
pub async fn list_sites(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<SiteSummary>> {
    let scope = site_listing_scope(db, actor).await?;
    let sites = Site::find()
        .filter(scope.site_condition())
        .order_by_asc(site::Column::Name)
        .all(db)
        .await?;

    let mut summaries = Vec::with_capacity(sites.len());
    for site in sites {
        let engineer_ids = engineer_ids(db, site.id).await?;
        summaries.push(SiteSummary { site, engineer_ids });
    }
    Ok(summaries)
}

/// Registers a new site.
pub async fn create_site(
    db: &DatabaseConnection,
    actor: &Actor,
    input: NewSite,
) -> Result<site::Model> {
    ensure_can_register(actor)?;

    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Site name is required"));
    }
    if let Some(chief_id) = input.chief_engineer_id {
        ensure_chief_role(db, chief_id).await?;
    }

    let site = site::ActiveModel {
        name: Set(name),
        location: Set(input.location),
        description: Set(input.description),
        chief_engineer_id: Set(input.chief_engineer_id),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(site_id = site.id, by = actor.id, "Site registered");
    Ok(site)
}

/// Edits a site.
pub async fn update_site(
    db: &DatabaseConnection,
    actor: &Actor,
    site_id: i64,
    changes: SiteUpdate,
) -> Result<site::Model> {
    let site = load_own_site(db, actor, site_id, "edit this site").await?;
    let mut model: site::ActiveModel = site.into();

    if let Some(name) = changes.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("Site name is required"));
        }
        model.name = Set(name);
    }
    if let Some(location) = changes.location {
        model.location = Set(location);
    }
    if let Some(description) = changes.description {
        model.description = Set(description);
    }
    if let Some(chief_id) = changes.chief_engineer_id {
        ensure_chief_role(db, chief_id).await?;
        model.chief_engineer_id = Set(Some(chief_id));
    }
    if let Some(is_active) = changes.is_active {
        model.is_active = Set(is_active);
    }

    model.update(db).await.map_err(Into::into)
}

/// Replaces the set of engineers assigned to a site.
///
/// Ids that do not belong to site engineers are ignored. Returns the resulting
/// assignment, ascending.
pub async fn assign_engineers(
    db: &DatabaseConnection,
    actor: &Actor,
    site_id: i64,
    requested: Vec<i64>,
) -> Result<Vec<i64>> {
    let site = load_own_site(db, actor, site_id, "assign engineers to this site").await?;

    let txn = db.begin().await?;

    let engineers: Vec<i64> = User::find()
        .select_only()
        .column(user::Column::Id)
        .filter(user::Column::Id.is_in(requested))
        .filter(user::Column::Role.eq(Role::SiteEngineer))
        .into_tuple::<i64>()
        .all(&txn)
        .await?;

    SiteEngineer::delete_many()
        .filter(site_engineer::Column::SiteId.eq(site.id))
        .exec(&txn)
        .await?;
    for user_id in &engineers {
        site_engineer::ActiveModel {
            site_id: Set(site.id),
            user_id: Set(*user_id),
        }
        .insert(&txn)
        .await?;
    }

    let assigned = engineer_ids(&txn, site.id).await?;
    txn.commit().await?;

    info!(site_id, engineers = assigned.len(), by = actor.id, "Engineers assigned");
    Ok(assigned)
}

/// Deletes a site together with its employees and their attendance and payroll.
pub async fn delete_site(db: &DatabaseConnection, actor: &Actor, site_id: i64) -> Result<()> {
    let site = load_own_site(db, actor, site_id, "delete this site").await?;

    let txn = db.begin().await?;

    let employees_here = Employee::find()
        .select_only()
        .column(employee::Column::Id)
        .filter(employee::Column::SiteId.eq(site.id))
        .into_query();

    Payroll::delete_many()
        .filter(payroll::Column::EmployeeId.in_subquery(employees_here.clone()))
        .exec(&txn)
        .await?;
    Attendance::delete_many()
        .filter(attendance::Column::EmployeeId.in_subquery(employees_here))
        .exec(&txn)
        .await?;
    Employee::delete_many()
        .filter(employee::Column::SiteId.eq(site.id))
        .exec(&txn)
        .await?;
    SiteEngineer::delete_many()
        .filter(site_engineer::Column::SiteId.eq(site.id))
        .exec(&txn)
        .await?;
    site.delete(&txn).await?;

    txn.commit().await?;
    info!(site_id, by = actor.id, "Site deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn new_site(name: &str, chief: Option<i64>) -> NewSite {
        NewSite {
            name: name.to_string(),
            location: "Kigali".to_string(),
            description: String::new(),
            chief_engineer_id: chief,
        }
    }

    #[tokio::test]
    async fn test_create_site_validation() -> Result<()> {
        let w = setup_world().await?;

        let blank = create_site(&w.db, &w.admin, new_site("  ", None)).await;
        assert!(matches!(blank, Err(Error::Validation { .. })));

        let not_a_chief =
            create_site(&w.db, &w.admin, new_site("Depot", Some(w.engineer.id))).await;
        assert!(matches!(not_a_chief, Err(Error::Validation { .. })));

        let by_engineer = create_site(&w.db, &w.engineer, new_site("Depot", None)).await;
        assert!(matches!(by_engineer, Err(Error::NotAuthorized { .. })));

        let site = create_site(&w.db, &w.chief, new_site("Depot", Some(w.chief.id))).await?;
        assert_eq!(site.chief_engineer_id, Some(w.chief.id));
        assert!(site.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_sites_per_role() -> Result<()> {
        let w = setup_world().await?;

        let for_chief = list_sites(&w.db, &w.chief).await?;
        assert_eq!(for_chief.len(), 2);

        let for_engineer = list_sites(&w.db, &w.engineer).await?;
        assert_eq!(for_engineer.len(), 1);
        assert_eq!(for_engineer[0].site.id, w.site_a.id);
        assert_eq!(for_engineer[0].engineer_ids, vec![w.engineer.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_chief_edits_only_own_site() -> Result<()> {
        let w = setup_world().await?;
        let changes = SiteUpdate {
            location: Some("Musanze".to_string()),
            is_active: Some(false),
            ..Default::default()
        };

        let updated = update_site(&w.db, &w.chief, w.site_a.id, changes.clone()).await?;
        assert_eq!(updated.location, "Musanze");
        assert!(!updated.is_active);

        let denied = update_site(&w.db, &w.chief, w.site_b.id, changes).await;
        assert!(matches!(denied, Err(Error::NotAuthorized { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_engineers_replaces_set() -> Result<()> {
        let w = setup_world().await?;

        let assigned = assign_engineers(
            &w.db,
            &w.admin,
            w.site_a.id,
            vec![w.other_engineer.id, w.chief.id],
        )
        .await?;
        assert_eq!(assigned, vec![w.other_engineer.id]);
        assert_eq!(engineer_ids(&w.db, w.site_a.id).await?, vec![w.other_engineer.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_site_cascades() -> Result<()> {
        let w = setup_world().await?;
        create_test_attendance(&w.db, &w.admin, w.employee_a.id, "100", 1, test_date()).await?;

        let denied = delete_site(&w.db, &w.engineer, w.site_a.id).await;
        assert!(matches!(denied, Err(Error::NotAuthorized { .. })));

        delete_site(&w.db, &w.chief, w.site_a.id).await?;
        assert!(get_site(&w.db, w.site_a.id).await?.is_none());
        assert!(
            Employee::find_by_id(w.employee_a.id)
                .one(&w.db)
                .await?
                .is_none()
        );
        assert_eq!(Attendance::find().count(&w.db).await?, 0);
        Ok(())
    }
}
