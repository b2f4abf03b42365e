use db::models::{
    project, project_colleague,
    project_update::{self, UpdateType},
    project_update_read,
};
use sea_orm::{DbConn, EntityTrait, TransactionTrait};

use crate::auth::AuthUser;
use crate::error::ServiceResult;

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub password: String,
    /// Generated server-side when absent.
    pub join_code: Option<String>,
    pub departments: Vec<String>,
    pub ticket_types: Vec<String>,
    pub statuses: Vec<String>,
    pub urgencies: Vec<String>,
}

impl NewProject {
    pub fn named(name: &str, password: &str) -> Self {
        Self {
            name: name.to_owned(),
            password: password.to_owned(),
            join_code: None,
            departments: Vec::new(),
            ticket_types: Vec::new(),
            statuses: Vec::new(),
            urgencies: Vec::new(),
        }
    }

    pub fn with_join_code(mut self, join_code: &str) -> Self {
        self.join_code = Some(join_code.to_owned());
        self
    }
}

/// Project lifecycle operations around the change-log core.
pub struct ProjectFlow;

impl ProjectFlow {
    /// Creates a project led by the acting user, with the genesis MAIN
    /// change-log entry at `update_id = 0`, pre-read by the leader.
    ///
    /// The project row, genesis entry and leader read row commit in one
    /// transaction; a project without its genesis entry never becomes
    /// visible.
    pub async fn create(
        db: &DbConn,
        actor: &AuthUser,
        params: NewProject,
    ) -> ServiceResult<project::Model> {
        let join_code = params
            .join_code
            .unwrap_or_else(project::Model::generate_join_code);

        let txn = db.begin().await?;
        let project = project::Model::create(
            &txn,
            &params.name,
            &join_code,
            &params.password,
            actor.id,
            params.departments,
            params.ticket_types,
            params.statuses,
            params.urgencies,
        )
        .await?;

        let genesis =
            project_update::Model::create(&txn, project.id, 0, UpdateType::Main, actor.id, None)
                .await?;
        project_update_read::Model::mark(&txn, genesis.id, actor.id).await?;
        txn.commit().await?;

        tracing::info!(project_id = project.id, leader_id = actor.id, "created project");
        Ok(project)
    }

    /// Projects the user leads plus projects they joined as a colleague.
    pub async fn find_for_user(db: &DbConn, user_id: i64) -> ServiceResult<Vec<project::Model>> {
        let mut projects = project::Model::find_led_by(db, user_id).await?;

        for membership in project_colleague::Model::find_all_for_user(db, user_id).await? {
            if let Some(found) = project::Entity::find_by_id(membership.project_id)
                .one(db)
                .await?
            {
                projects.push(found);
            }
        }

        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::user;
    use db::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_create_writes_genesis_entry_read_by_leader() {
        let db = setup_test_db().await;
        let leader = user::Model::create(&db, "lead", "lead@example.com")
            .await
            .unwrap();
        let actor = AuthUser::from(&leader);

        let project = ProjectFlow::create(&db, &actor, NewProject::named("Helpdesk", "pw"))
            .await
            .unwrap();
        assert_eq!(project.latest_update_id, 0);
        assert_eq!(project.ticket_count, 0);
        assert_eq!(project.join_code.len(), 8);

        let genesis = project_update::Model::find_by_update_id(&db, project.id, 0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(genesis.update_type, UpdateType::Main);
        assert_eq!(genesis.ticket_id, None);

        let readers = project_update_read::Model::reader_ids(&db, genesis.id)
            .await
            .unwrap();
        assert_eq!(readers, vec![leader.id]);
    }

    #[tokio::test]
    async fn test_find_for_user_covers_both_roles() {
        let db = setup_test_db().await;
        let lead_row = user::Model::create(&db, "lead", "lead@example.com")
            .await
            .unwrap();
        let ana_row = user::Model::create(&db, "ana", "ana@example.com")
            .await
            .unwrap();
        let lead = AuthUser::from(&lead_row);
        let ana = AuthUser::from(&ana_row);

        let led = ProjectFlow::create(&db, &lead, NewProject::named("Led", "pw"))
            .await
            .unwrap();
        let joined = ProjectFlow::create(&db, &ana, NewProject::named("Joined", "pw"))
            .await
            .unwrap();
        project_colleague::Model::add(&db, joined.id, lead.id)
            .await
            .unwrap();

        let mut ids: Vec<i64> = ProjectFlow::find_for_user(&db, lead.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();
        let mut expected = vec![led.id, joined.id];
        expected.sort_unstable();
        assert_eq!(ids, expected);
    }
}
