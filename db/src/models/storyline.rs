use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A ticket's caption history container. Exactly one ticket owns a
/// storyline through `tickets.storyline_id`; the storyline is created
/// first and the ticket row then takes the reference.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storylines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub project_id: i64,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,

    #[sea_orm(has_many = "super::storyline_entry::Entity")]
    StorylineEntry,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::storyline_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorylineEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(db: &DbConn, project_id: i64) -> Result<Model, DbErr> {
        let active = ActiveModel {
            project_id: Set(project_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active.insert(db).await
    }

    pub async fn delete(db: &DbConn, storyline_id: i64) -> Result<(), DbErr> {
        Entity::delete_by_id(storyline_id).exec(db).await?;
        Ok(())
    }
}
