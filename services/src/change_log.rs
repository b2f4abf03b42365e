use db::models::{
    project,
    project_update::{self, UpdateType},
    project_update_read,
};
use sea_orm::DbConn;
use sea_orm::{EntityTrait, TransactionTrait};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::{ServiceError, ServiceResult};
use crate::membership::MembershipGuard;

/// Upper bound on compare-and-swap retries when appending. Contention
/// is per project, so a writer only retries while other writers on the
/// same project keep winning the counter race.
const MAX_CAS_ATTEMPTS: usize = 10;

/// The per-project append-only change log used for incremental client
/// sync. Entries are sequenced by `update_id`, allocated through a
/// conditional update on the project row's `latest_update_id`.
pub struct ChangeLog;

/// A change-log entry together with the users who acknowledged it.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeLogEntry {
    pub update: project_update::Model,
    pub read_by: Vec<i64>,
}

/// Everything a client missed since the version it reported.
///
/// `affected_ticket_ids` is deduplicated in first-occurrence order
/// (newest first); the client re-fetches those tickets and purges the
/// ones in `deleted_ticket_ids`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectDiff {
    pub has_updates: bool,
    pub entries: Vec<project_update::Model>,
    pub affected_ticket_ids: Vec<i64>,
    pub deleted_ticket_ids: Vec<i64>,
}

impl ChangeLog {
    /// Appends an entry and returns its `update_id`.
    ///
    /// The acting user is pre-marked as having read their own entry so
    /// their client never reports the change as unread.
    ///
    /// The counter bump, the entry row and the read row commit in one
    /// transaction; a failure mid-append rolls all three back, so the
    /// log never shows a counter value without a matching entry.
    pub async fn append(
        db: &DbConn,
        project_id: i64,
        ticket_id: Option<i64>,
        update_type: UpdateType,
        actor: &AuthUser,
    ) -> ServiceResult<i64> {
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let project = project::Entity::find_by_id(project_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::not_found("project"))?;

            let current = project.latest_update_id;
            let txn = db.begin().await?;
            if project::Model::try_advance_latest_update(&txn, project_id, current).await? {
                let next = current + 1;
                let entry = project_update::Model::create(
                    &txn,
                    project_id,
                    next,
                    update_type,
                    actor.id,
                    ticket_id,
                )
                .await?;
                project_update_read::Model::mark(&txn, entry.id, actor.id).await?;
                txn.commit().await?;

                tracing::debug!(project_id, update_id = next, %update_type, "appended change log entry");
                return Ok(next);
            }
            txn.rollback().await?;

            tracing::debug!(project_id, attempt, "lost the update counter race, retrying");
        }

        Err(ServiceError::Conflict)
    }

    /// Computes what a client at `client_version` has missed.
    ///
    /// A client reporting a version ahead of the server is broken state,
    /// not an empty diff, and fails with `InvalidVersion`.
    pub async fn diff_since(
        db: &DbConn,
        project_id: i64,
        client_version: i64,
    ) -> ServiceResult<ProjectDiff> {
        let project = project::Entity::find_by_id(project_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("project"))?;

        let latest = project.latest_update_id;
        if client_version > latest {
            return Err(ServiceError::InvalidVersion {
                client: client_version,
                latest,
            });
        }
        if client_version == latest {
            return Ok(ProjectDiff::default());
        }

        let entries = project_update::Model::find_since(db, project_id, client_version).await?;

        let mut affected_ticket_ids = Vec::new();
        let mut deleted_ticket_ids = Vec::new();
        for entry in &entries {
            if let Some(ticket_id) = entry.ticket_id {
                if !affected_ticket_ids.contains(&ticket_id) {
                    affected_ticket_ids.push(ticket_id);
                }
                if entry.update_type == UpdateType::DeleteTicket
                    && !deleted_ticket_ids.contains(&ticket_id)
                {
                    deleted_ticket_ids.push(ticket_id);
                }
            }
        }

        Ok(ProjectDiff {
            has_updates: true,
            entries,
            affected_ticket_ids,
            deleted_ticket_ids,
        })
    }

    /// Acknowledges one entry for the acting user.
    pub async fn mark_read(
        db: &DbConn,
        project_id: i64,
        update_id: i64,
        actor: &AuthUser,
    ) -> ServiceResult<ChangeLogEntry> {
        let project = project::Entity::find_by_id(project_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("project"))?;

        MembershipGuard::ensure_member(db, &project, actor.id).await?;

        let entry = project_update::Model::find_by_update_id(db, project_id, update_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("update"))?;

        if project_update_read::Model::has_read(db, entry.id, actor.id).await? {
            return Err(ServiceError::AlreadyRead);
        }
        project_update_read::Model::mark(db, entry.id, actor.id).await?;

        let read_by = project_update_read::Model::reader_ids(db, entry.id).await?;
        Ok(ChangeLogEntry {
            update: entry,
            read_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project_flow::{NewProject, ProjectFlow};
    use db::models::{project_colleague, user};
    use db::test_utils::setup_test_db;
    use futures::future::join_all;
    use std::collections::HashSet;

    async fn seed(db: &DbConn) -> (project::Model, AuthUser) {
        let leader = user::Model::create(db, "lead", "lead@example.com")
            .await
            .unwrap();
        let actor = AuthUser::from(&leader);
        let project = ProjectFlow::create(db, &actor, NewProject::named("Helpdesk", "swordfish"))
            .await
            .unwrap();
        (project, actor)
    }

    #[tokio::test]
    async fn test_append_is_strictly_sequential() {
        let db = setup_test_db().await;
        let (project, actor) = seed(&db).await;

        for expected in 1..=25 {
            let update_id = ChangeLog::append(
                &db,
                project.id,
                Some(500 + expected),
                UpdateType::CreateTicket,
                &actor,
            )
            .await
            .unwrap();
            assert_eq!(update_id, expected);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_never_collide() {
        let db = setup_test_db().await;
        let (project, actor) = seed(&db).await;

        let appends = (0..6).map(|i| {
            let db = &db;
            let actor = &actor;
            async move {
                ChangeLog::append(db, project.id, Some(i), UpdateType::UpdateTicket, actor)
                    .await
                    .unwrap()
            }
        });
        let ids: Vec<i64> = join_all(appends).await;

        let unique: HashSet<i64> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 6);
        assert_eq!(unique, (1..=6).collect::<HashSet<i64>>());
    }

    #[tokio::test]
    async fn test_failed_append_leaves_the_counter_unchanged() {
        let db = setup_test_db().await;
        let (project, actor) = seed(&db).await;

        // Occupy the next sequence slot directly so the entry insert
        // inside append fails on the unique (project_id, update_id)
        // index after the counter bump already went through.
        let rogue = project_update::Model::create(
            &db,
            project.id,
            1,
            UpdateType::CreateTicket,
            actor.id,
            None,
        )
        .await
        .unwrap();

        let err = ChangeLog::append(&db, project.id, Some(3), UpdateType::CreateTicket, &actor)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Db(_)));

        // The whole append rolled back: no counter advance, no gap.
        let reloaded = project::Entity::find_by_id(project.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.latest_update_id, 0);

        // With the slot free again the same append goes through.
        project_update::Entity::delete_by_id(rogue.id)
            .exec(&db)
            .await
            .unwrap();
        let update_id = ChangeLog::append(&db, project.id, Some(3), UpdateType::CreateTicket, &actor)
            .await
            .unwrap();
        assert_eq!(update_id, 1);
    }

    #[tokio::test]
    async fn test_diff_since_returns_exactly_the_missed_entries() {
        let db = setup_test_db().await;
        let (project, actor) = seed(&db).await;

        let t1 = 101;
        let t2 = 102;
        ChangeLog::append(&db, project.id, Some(t1), UpdateType::CreateTicket, &actor)
            .await
            .unwrap();
        ChangeLog::append(&db, project.id, Some(t2), UpdateType::CreateTicket, &actor)
            .await
            .unwrap();
        ChangeLog::append(&db, project.id, Some(t1), UpdateType::UpdateTicket, &actor)
            .await
            .unwrap();

        let diff = ChangeLog::diff_since(&db, project.id, 1).await.unwrap();
        assert!(diff.has_updates);
        let ids: Vec<i64> = diff.entries.iter().map(|e| e.update_id).collect();
        assert_eq!(ids, vec![3, 2]);
        // Newest-first dedup: t1's update entry comes before t2's create.
        assert_eq!(diff.affected_ticket_ids, vec![t1, t2]);
        assert!(diff.deleted_ticket_ids.is_empty());
    }

    #[tokio::test]
    async fn test_diff_since_with_no_new_entries() {
        let db = setup_test_db().await;
        let (project, actor) = seed(&db).await;

        ChangeLog::append(&db, project.id, Some(7), UpdateType::CreateTicket, &actor)
            .await
            .unwrap();

        let diff = ChangeLog::diff_since(&db, project.id, 1).await.unwrap();
        assert!(!diff.has_updates);
        assert!(diff.entries.is_empty());
        assert!(diff.affected_ticket_ids.is_empty());
    }

    #[tokio::test]
    async fn test_diff_since_rejects_client_ahead_of_server() {
        let db = setup_test_db().await;
        let (project, _) = seed(&db).await;

        let err = ChangeLog::diff_since(&db, project.id, 5).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidVersion { client: 5, latest: 0 }
        ));
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotency_guarded() {
        let db = setup_test_db().await;
        let (project, leader) = seed(&db).await;

        let colleague_row = user::Model::create(&db, "ana", "ana@example.com")
            .await
            .unwrap();
        let colleague = AuthUser::from(&colleague_row);
        project_colleague::Model::add(&db, project.id, colleague.id)
            .await
            .unwrap();

        ChangeLog::append(&db, project.id, Some(9), UpdateType::CreateTicket, &leader)
            .await
            .unwrap();

        let entry = ChangeLog::mark_read(&db, project.id, 1, &colleague)
            .await
            .unwrap();
        assert_eq!(entry.update.update_id, 1);
        // Leader pre-read their own append, so both are present now.
        assert_eq!(
            entry.read_by.iter().copied().collect::<HashSet<i64>>(),
            HashSet::from([leader.id, colleague.id])
        );

        let err = ChangeLog::mark_read(&db, project.id, 1, &colleague)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyRead));
    }

    #[tokio::test]
    async fn test_mark_read_guards() {
        let db = setup_test_db().await;
        let (project, leader) = seed(&db).await;

        let outsider_row = user::Model::create(&db, "eve", "eve@example.com")
            .await
            .unwrap();
        let outsider = AuthUser::from(&outsider_row);

        let err = ChangeLog::mark_read(&db, project.id, 0, &outsider)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));

        let err = ChangeLog::mark_read(&db, project.id, 42, &leader)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = ChangeLog::mark_read(&db, 9999, 0, &leader).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
