use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::QueryFilter;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Colleague membership rows. The composite primary key makes a
/// duplicate membership unrepresentable.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_colleagues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    pub joined_at: DateTime<Utc>,
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
    pub async fn add(db: &DbConn, project_id: i64, user_id: i64) -> Result<Model, DbErr> {
        let active = ActiveModel {
            project_id: Set(project_id),
            user_id: Set(user_id),
            joined_at: Set(Utc::now()),
        };

        active.insert(db).await
    }

    pub async fn exists(db: &DbConn, project_id: i64, user_id: i64) -> Result<bool, DbErr> {
        let found = Entity::find_by_id((project_id, user_id)).one(db).await?;
        Ok(found.is_some())
    }

    pub async fn find_all_for_user(db: &DbConn, user_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .all(db)
            .await
    }
}
