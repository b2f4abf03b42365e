use db::models::project;
use sea_orm::DbConn;
use sea_orm::EntityTrait;

use crate::error::{ServiceError, ServiceResult};

const MAX_CAS_ATTEMPTS: usize = 10;

/// Allocates per-project ticket display numbers. `tid`s are dense from
/// 1: the counter only ever moves forward by one, through a conditional
/// update, so concurrent creators can never share a number.
pub struct TicketCounter;

impl TicketCounter {
    pub async fn next(db: &DbConn, project_id: i64) -> ServiceResult<i64> {
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let project = project::Entity::find_by_id(project_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::not_found("project"))?;

            let current = project.ticket_count;
            if project::Model::try_advance_ticket_count(db, project_id, current).await? {
                return Ok(current + 1);
            }

            tracing::debug!(project_id, attempt, "lost the ticket counter race, retrying");
        }

        Err(ServiceError::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;
    use crate::project_flow::{NewProject, ProjectFlow};
    use db::models::user;
    use db::test_utils::setup_test_db;
    use futures::future::join_all;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_sequential_allocation_is_dense_from_one() {
        let db = setup_test_db().await;
        let leader = user::Model::create(&db, "lead", "lead@example.com")
            .await
            .unwrap();
        let actor = AuthUser::from(&leader);
        let project = ProjectFlow::create(&db, &actor, NewProject::named("Helpdesk", "pw"))
            .await
            .unwrap();

        for expected in 1..=10 {
            assert_eq!(TicketCounter::next(&db, project.id).await.unwrap(), expected);
        }

        let reloaded = project::Entity::find_by_id(project.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.ticket_count, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_allocation_has_no_gaps_or_duplicates() {
        let db = setup_test_db().await;
        let leader = user::Model::create(&db, "lead", "lead@example.com")
            .await
            .unwrap();
        let actor = AuthUser::from(&leader);
        let project = ProjectFlow::create(&db, &actor, NewProject::named("Helpdesk", "pw"))
            .await
            .unwrap();

        let allocations = (0..6).map(|_| {
            let db = &db;
            async move { TicketCounter::next(db, project.id).await.unwrap() }
        });
        let tids: Vec<i64> = join_all(allocations).await;

        let unique: HashSet<i64> = tids.iter().copied().collect();
        assert_eq!(unique, (1..=6).collect::<HashSet<i64>>());
    }

    #[tokio::test]
    async fn test_unknown_project_fails_not_found() {
        let db = setup_test_db().await;
        let err = TicketCounter::next(&db, 404).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
