use db::models::{project, project_colleague};
use sea_orm::DbConn;

use crate::auth::AuthUser;
use crate::error::{ServiceError, ServiceResult};
use crate::membership::MembershipGuard;

/// Password-gated colleague enrollment. Looked up by the public join
/// code, never the internal project id.
pub struct ProjectJoinFlow;

impl ProjectJoinFlow {
    pub async fn join(
        db: &DbConn,
        join_code: &str,
        password: &str,
        actor: &AuthUser,
    ) -> ServiceResult<project::Model> {
        let project = project::Model::find_by_join_code(db, join_code)
            .await?
            .ok_or_else(|| ServiceError::not_found("project"))?;

        // Project passwords are shared join secrets, compared as-is.
        if project.password != password {
            return Err(ServiceError::InvalidCredentials);
        }
        if MembershipGuard::is_leader(&project, actor.id) {
            return Err(ServiceError::AlreadyLeader);
        }
        if project_colleague::Model::exists(db, project.id, actor.id).await? {
            return Err(ServiceError::AlreadyMember);
        }

        project_colleague::Model::add(db, project.id, actor.id).await?;
        tracing::info!(project_id = project.id, user_id = actor.id, "user joined project");

        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project_flow::{NewProject, ProjectFlow};
    use db::models::user;
    use db::test_utils::setup_test_db;

    async fn seed(db: &DbConn) -> (project::Model, AuthUser, AuthUser) {
        let leader = user::Model::create(db, "lead", "lead@example.com")
            .await
            .unwrap();
        let joiner = user::Model::create(db, "ana", "ana@example.com")
            .await
            .unwrap();
        let leader = AuthUser::from(&leader);
        let project = ProjectFlow::create(
            db,
            &leader,
            NewProject::named("Helpdesk", "swordfish").with_join_code("HD-2026"),
        )
        .await
        .unwrap();
        (project, leader, AuthUser::from(&joiner))
    }

    #[tokio::test]
    async fn test_join_succeeds_with_correct_password() {
        let db = setup_test_db().await;
        let (project, _, joiner) = seed(&db).await;

        let joined = ProjectJoinFlow::join(&db, "HD-2026", "swordfish", &joiner)
            .await
            .unwrap();
        assert_eq!(joined.id, project.id);
        assert!(project_colleague::Model::exists(&db, project.id, joiner.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_join_rejects_unknown_code_and_wrong_password() {
        let db = setup_test_db().await;
        let (_, _, joiner) = seed(&db).await;

        let err = ProjectJoinFlow::join(&db, "NOPE", "swordfish", &joiner)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = ProjectJoinFlow::join(&db, "HD-2026", "guppy", &joiner)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_leader_cannot_join_own_project() {
        let db = setup_test_db().await;
        let (_, leader, _) = seed(&db).await;

        let err = ProjectJoinFlow::join(&db, "HD-2026", "swordfish", &leader)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyLeader));
    }

    #[tokio::test]
    async fn test_rejoining_is_a_no_op_failure() {
        let db = setup_test_db().await;
        let (project, _, joiner) = seed(&db).await;

        ProjectJoinFlow::join(&db, "HD-2026", "swordfish", &joiner)
            .await
            .unwrap();
        let err = ProjectJoinFlow::join(&db, "HD-2026", "swordfish", &joiner)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyMember));

        let rows = project_colleague::Model::find_all_for_user(&db, joiner.id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].project_id, project.id);
    }
}
