use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::QueryFilter;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Represents a ticket in the `tickets` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub project_id: i64,
    /// Owning user; the only one allowed to mutate or delete the ticket.
    pub user_id: i64,

    /// Per-project display number, dense from 1.
    pub tid: i64,

    pub title: String,
    pub body: String,
    pub status: String,
    pub urgency: String,
    pub department: String,
    pub ticket_type: String,

    pub storyline_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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

    #[sea_orm(
        belongs_to = "super::storyline::Entity",
        from = "Column::StorylineId",
        to = "super::storyline::Column::Id"
    )]
    Storyline,
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

impl Related<super::storyline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Storyline.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub struct NewTicket {
    pub title: String,
    pub body: String,
    pub status: String,
    pub urgency: String,
    pub department: String,
    pub ticket_type: String,
}

impl Model {
    pub async fn create(
        db: &DbConn,
        project_id: i64,
        user_id: i64,
        tid: i64,
        storyline_id: i64,
        fields: &NewTicket,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();

        let active = ActiveModel {
            project_id: Set(project_id),
            user_id: Set(user_id),
            tid: Set(tid),
            title: Set(fields.title.to_owned()),
            body: Set(fields.body.to_owned()),
            status: Set(fields.status.to_owned()),
            urgency: Set(fields.urgency.to_owned()),
            department: Set(fields.department.to_owned()),
            ticket_type: Set(fields.ticket_type.to_owned()),
            storyline_id: Set(storyline_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(db).await
    }

    pub async fn find_for_user_in_project(
        db: &DbConn,
        user_id: i64,
        project_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ProjectId.eq(project_id))
            .all(db)
            .await
    }

    pub async fn delete(db: &DbConn, ticket_id: i64) -> Result<(), DbErr> {
        Entity::delete_by_id(ticket_id).exec(db).await?;
        Ok(())
    }
}
