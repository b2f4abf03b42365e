use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One entry in a project's change log.
///
/// `update_id` is the per-project sequence number, strictly increasing
/// by one per append with `0` reserved for the genesis `Main` entry.
/// Once inserted the row never changes; only the read set
/// (`project_update_reads`) grows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_updates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub project_id: i64,
    pub update_id: i64,

    pub update_type: UpdateType,

    /// User whose change produced this entry.
    pub user_id: i64,
    /// Absent only for the genesis `Main` entry.
    pub ticket_id: Option<i64>,

    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "project_update_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum UpdateType {
    #[sea_orm(string_value = "main")]
    Main,

    #[sea_orm(string_value = "create_ticket")]
    CreateTicket,

    #[sea_orm(string_value = "update_ticket")]
    UpdateTicket,

    #[sea_orm(string_value = "delete_ticket")]
    DeleteTicket,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        project_id: i64,
        update_id: i64,
        update_type: UpdateType,
        user_id: i64,
        ticket_id: Option<i64>,
    ) -> Result<Model, DbErr> {
        let active = ActiveModel {
            project_id: Set(project_id),
            update_id: Set(update_id),
            update_type: Set(update_type),
            user_id: Set(user_id),
            ticket_id: Set(ticket_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active.insert(db).await
    }

    pub async fn find_by_update_id(
        db: &DbConn,
        project_id: i64,
        update_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ProjectId.eq(project_id))
            .filter(Column::UpdateId.eq(update_id))
            .one(db)
            .await
    }

    /// Entries with `update_id > after`, newest first.
    pub async fn find_since(
        db: &DbConn,
        project_id: i64,
        after: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ProjectId.eq(project_id))
            .filter(Column::UpdateId.gt(after))
            .order_by_desc(Column::UpdateId)
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{project, user};
    use crate::test_utils::setup_test_db;

    async fn seed_project(db: &DbConn, join_code: &str) -> (project::Model, user::Model) {
        let leader = user::Model::create(db, join_code, &format!("{join_code}@example.com"))
            .await
            .unwrap();
        let project = project::Model::create(
            db,
            "Helpdesk",
            join_code,
            "swordfish",
            leader.id,
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .await
        .unwrap();
        (project, leader)
    }

    #[tokio::test]
    async fn test_update_id_is_unique_per_project() {
        let db = setup_test_db().await;
        let (project, leader) = seed_project(&db, "HD-2026").await;

        Model::create(&db, project.id, 1, UpdateType::CreateTicket, leader.id, Some(10))
            .await
            .unwrap();

        // Second row claiming the same sequence slot must be rejected.
        let duplicate =
            Model::create(&db, project.id, 1, UpdateType::UpdateTicket, leader.id, Some(11)).await;
        assert!(duplicate.is_err());

        // The slot is only taken within that project.
        let (other, other_leader) = seed_project(&db, "HD-2027").await;
        Model::create(&db, other.id, 1, UpdateType::CreateTicket, other_leader.id, None)
            .await
            .unwrap();
    }
}
