//! Notification relay between site engineers and chief engineers.
//!
//! Notifications are never created directly: a payroll submission fans out one
//! notification per site to that site's chief, and a chief's reply goes back to the
//! submitter. Recipients can only mark them as read.

use crate::{
    core::{access::Actor, attendance::visible_day},
    entities::{Notification, NotificationType, Site, notification, site},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Result of [`submit_payroll_to_chief`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    /// Notifications sent, one per site with a chief
    pub notifications_sent: usize,
    /// Names of sites that had attendance but no chief to notify
    pub sites_without_chief: Vec<String>,
}

#[derive(Default)]
struct SiteDay {
    employees: BTreeSet<i64>,
    total: Decimal,
}

/// Submits the day's payroll: one notification per site, addressed to its chief.
///
/// Only the attendance visible to the actor is included.
pub async fn submit_payroll_to_chief(
    db: &DatabaseConnection,
    actor: &Actor,
    date: NaiveDate,
) -> Result<SubmissionOutcome> {
    let txn = db.begin().await?;

    let rows = visible_day(&txn, actor, date).await?;
    if rows.is_empty() {
        return Err(Error::NoAttendance {
            employee_id: None,
            date,
        });
    }

    let mut per_site: BTreeMap<i64, SiteDay> = BTreeMap::new();
    for (record, employee) in rows {
        let day = per_site.entry(employee.site_id).or_default();
        day.employees.insert(employee.id);
        day.total += record.total_amount;
    }

    let sites = Site::find()
        .filter(site::Column::Id.is_in(per_site.keys().copied().collect::<Vec<_>>()))
        .all(&txn)
        .await?;

    let now = chrono::Utc::now();
    let mut outcome = SubmissionOutcome {
        notifications_sent: 0,
        sites_without_chief: Vec::new(),
    };
    for site in sites {
        let Some(day) = per_site.get(&site.id) else {
            continue;
        };
        let Some(chief_id) = site.chief_engineer_id else {
            warn!(site_id = site.id, "Site has no chief engineer, submission skipped");
            outcome.sites_without_chief.push(site.name);
            continue;
        };

        notification::ActiveModel {
            recipient_id: Set(chief_id),
            sender_id: Set(Some(actor.id)),
            title: Set(format!("Payroll submitted for {}", site.name)),
            message: Set(format!(
                "Payroll for {} on {date}: {} employee(s), total {}.",
                site.name,
                day.employees.len(),
                day.total
            )),
            notification_type: Set(NotificationType::PayrollSubmission),
            related_date: Set(Some(date)),
            related_site: Set(site.name.clone()),
            is_read: Set(false),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        outcome.notifications_sent += 1;
    }

    txn.commit().await?;
    info!(
        %date,
        sent = outcome.notifications_sent,
        by = actor.id,
        "Payroll submitted to chiefs"
    );
    Ok(outcome)
}

/// Answers a payroll submission addressed to the actor.
pub async fn reply_from_chief(
    db: &DatabaseConnection,
    actor: &Actor,
    notification_id: i64,
    reply: &str,
) -> Result<notification::Model> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(Error::validation("Reply text is required"));
    }

    let original = Notification::find_by_id(notification_id)
        .filter(notification::Column::RecipientId.eq(actor.id))
        .filter(notification::Column::NotificationType.eq(NotificationType::PayrollSubmission))
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "payroll submission",
            id: notification_id,
        })?;
    let sender_id = original
        .sender_id
        .ok_or_else(|| Error::validation("This submission has no sender to reply to"))?;

    let answer = notification::ActiveModel {
        recipient_id: Set(sender_id),
        sender_id: Set(Some(actor.id)),
        title: Set(format!("Reply on payroll for {}", original.related_site)),
        message: Set(reply.to_string()),
        notification_type: Set(NotificationType::PayrollReply),
        related_date: Set(original.related_date),
        related_site: Set(original.related_site),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(notification_id, reply_id = answer.id, by = actor.id, "Chief replied");
    Ok(answer)
}

/// Marks one of the actor's notifications as read.
pub async fn mark_read(
    db: &DatabaseConnection,
    actor: &Actor,
    notification_id: i64,
) -> Result<notification::Model> {
    let found = Notification::find_by_id(notification_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "notification",
            id: notification_id,
        })?;
    if found.recipient_id != actor.id {
        return Err(Error::not_authorized("read this notification"));
    }
    if found.is_read {
        return Ok(found);
    }

    let mut model: notification::ActiveModel = found.into();
    model.is_read = Set(true);
    model.update(db).await.map_err(Into::into)
}

/// The actor's notifications, newest first.
pub async fn list_notifications(
    db: &DatabaseConnection,
    actor: &Actor,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::RecipientId.eq(actor.id))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of unread notifications addressed to the actor.
pub async fn unread_count(db: &DatabaseConnection, actor: &Actor) -> Result<u64> {
    Notification::find()
        .filter(notification::Column::RecipientId.eq(actor.id))
        .filter(notification::Column::IsRead.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            employee::{NewEmployee, create_employee},
            site::{NewSite, assign_engineers, create_site},
        },
        test_utils::*,
    };

    #[tokio::test]
    async fn test_submission_notifies_chief_once_per_site() -> Result<()> {
        let w = setup_world().await?;
        let second = create_employee(
            &w.db,
            &w.admin,
            NewEmployee {
                full_name: "Second Worker".to_string(),
                national_id: "1200080000000000".to_string(),
                contact: String::new(),
                site_id: w.site_a.id,
                category_id: Some(w.category.id),
            },
        )
        .await?;
        create_test_attendance(&w.db, &w.admin, w.employee_a.id, "5000", 3, test_date()).await?;
        create_test_attendance(&w.db, &w.admin, second.id, "1000", 1, test_date()).await?;

        let outcome = submit_payroll_to_chief(&w.db, &w.engineer, test_date()).await?;
        assert_eq!(outcome.notifications_sent, 1);
        assert!(outcome.sites_without_chief.is_empty());

        let inbox = list_notifications(&w.db, &w.chief).await?;
        assert_eq!(inbox.len(), 1);
        let sent = &inbox[0];
        assert_eq!(sent.notification_type, NotificationType::PayrollSubmission);
        assert_eq!(sent.sender_id, Some(w.engineer.id));
        assert_eq!(sent.related_date, Some(test_date()));
        assert_eq!(sent.related_site, w.site_a.name);
        assert!(sent.message.contains("2 employee(s)"));

        assert!(list_notifications(&w.db, &w.other_chief).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_submission_without_attendance() -> Result<()> {
        let w = setup_world().await?;
        // Attendance exists, but not on a site the engineer can see.
        create_test_attendance(&w.db, &w.admin, w.employee_b.id, "100", 1, test_date()).await?;

        let result = submit_payroll_to_chief(&w.db, &w.engineer, test_date()).await;
        assert!(matches!(
            result,
            Err(Error::NoAttendance {
                employee_id: None,
                ..
            })
        ));
        assert_eq!(Notification::find().count(&w.db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_sites_without_chief_are_skipped() -> Result<()> {
        let w = setup_world().await?;
        let orphan = create_site(
            &w.db,
            &w.admin,
            NewSite {
                name: "Orphan Yard".to_string(),
                location: String::new(),
                description: String::new(),
                chief_engineer_id: None,
            },
        )
        .await?;
        assign_engineers(&w.db, &w.admin, orphan.id, vec![w.engineer.id]).await?;
        let worker = create_employee(
            &w.db,
            &w.engineer,
            NewEmployee {
                full_name: "Yard Worker".to_string(),
                national_id: "1198880000000000".to_string(),
                contact: String::new(),
                site_id: orphan.id,
                category_id: None,
            },
        )
        .await?;
        create_test_attendance(&w.db, &w.admin, worker.id, "100", 1, test_date()).await?;
        create_test_attendance(&w.db, &w.admin, w.employee_a.id, "100", 1, test_date()).await?;

        let outcome = submit_payroll_to_chief(&w.db, &w.engineer, test_date()).await?;
        assert_eq!(outcome.notifications_sent, 1);
        assert_eq!(outcome.sites_without_chief, vec!["Orphan Yard".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_reply_goes_back_to_sender() -> Result<()> {
        let w = setup_world().await?;
        create_test_attendance(&w.db, &w.admin, w.employee_a.id, "100", 1, test_date()).await?;
        submit_payroll_to_chief(&w.db, &w.engineer, test_date()).await?;
        let submission = list_notifications(&w.db, &w.chief).await?.remove(0);

        let blank = reply_from_chief(&w.db, &w.chief, submission.id, "  ").await;
        assert!(matches!(blank, Err(Error::Validation { .. })));

        let wrong_recipient =
            reply_from_chief(&w.db, &w.other_chief, submission.id, "Approved").await;
        assert!(matches!(wrong_recipient, Err(Error::NotFound { .. })));

        let reply = reply_from_chief(&w.db, &w.chief, submission.id, "Approved").await?;
        assert_eq!(reply.recipient_id, w.engineer.id);
        assert_eq!(reply.notification_type, NotificationType::PayrollReply);
        assert_eq!(reply.message, "Approved");
        assert_eq!(reply.related_site, submission.related_site);

        // Replies cannot themselves be replied to.
        let nested = reply_from_chief(&w.db, &w.engineer, reply.id, "Thanks").await;
        assert!(matches!(nested, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_read_and_unread_count() -> Result<()> {
        let w = setup_world().await?;
        create_test_attendance(&w.db, &w.admin, w.employee_a.id, "100", 1, test_date()).await?;
        submit_payroll_to_chief(&w.db, &w.engineer, test_date()).await?;
        let submission = list_notifications(&w.db, &w.chief).await?.remove(0);
        assert_eq!(unread_count(&w.db, &w.chief).await?, 1);

        let denied = mark_read(&w.db, &w.engineer, submission.id).await;
        assert!(matches!(denied, Err(Error::NotAuthorized { .. })));

        let read = mark_read(&w.db, &w.chief, submission.id).await?;
        assert!(read.is_read);
        assert_eq!(unread_count(&w.db, &w.chief).await?, 0);
        Ok(())
    }
}
