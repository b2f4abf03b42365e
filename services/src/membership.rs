use db::models::{project, project_colleague};
use sea_orm::{DbConn, DbErr};

use crate::error::{ServiceError, ServiceResult};

/// Authorization checks for project access. Every mutation that cares
/// about leader/colleague status goes through here so the identity
/// comparison lives in exactly one place.
pub struct MembershipGuard;

impl MembershipGuard {
    pub fn is_leader(project: &project::Model, user_id: i64) -> bool {
        project.leader_id == user_id
    }

    pub async fn is_member(
        db: &DbConn,
        project: &project::Model,
        user_id: i64,
    ) -> Result<bool, DbErr> {
        if Self::is_leader(project, user_id) {
            return Ok(true);
        }
        project_colleague::Model::exists(db, project.id, user_id).await
    }

    pub async fn ensure_member(
        db: &DbConn,
        project: &project::Model,
        user_id: i64,
    ) -> ServiceResult<()> {
        if Self::is_member(db, project, user_id).await? {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::user;
    use db::test_utils::setup_test_db;

    async fn seed_project(db: &DbConn) -> (project::Model, user::Model, user::Model) {
        let leader = user::Model::create(db, "lead", "lead@example.com")
            .await
            .unwrap();
        let other = user::Model::create(db, "other", "other@example.com")
            .await
            .unwrap();
        let project = project::Model::create(
            db,
            "Helpdesk",
            "HD-2026",
            "swordfish",
            leader.id,
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .await
        .unwrap();
        (project, leader, other)
    }

    #[tokio::test]
    async fn test_leader_is_member() {
        let db = setup_test_db().await;
        let (project, leader, _) = seed_project(&db).await;

        assert!(MembershipGuard::is_leader(&project, leader.id));
        assert!(MembershipGuard::is_member(&db, &project, leader.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_colleague_is_member_but_not_leader() {
        let db = setup_test_db().await;
        let (project, _, colleague) = seed_project(&db).await;

        project_colleague::Model::add(&db, project.id, colleague.id)
            .await
            .unwrap();

        assert!(!MembershipGuard::is_leader(&project, colleague.id));
        assert!(MembershipGuard::is_member(&db, &project, colleague.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_outsider_is_rejected() {
        let db = setup_test_db().await;
        let (project, _, outsider) = seed_project(&db).await;

        assert!(!MembershipGuard::is_member(&db, &project, outsider.id)
            .await
            .unwrap());

        let err = MembershipGuard::ensure_member(&db, &project, outsider.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }
}
