use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter};
use serde::{Deserialize, Serialize};

/// Read acknowledgments for change-log entries, one row per
/// `(entry, user)` pair. The composite primary key keeps the read set
/// duplicate-free.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_update_reads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_update_id: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    pub read_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project_update::Entity",
        from = "Column::ProjectUpdateId",
        to = "super::project_update::Column::Id"
    )]
    ProjectUpdate,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::project_update::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectUpdate.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn mark<C: ConnectionTrait>(
        db: &C,
        project_update_id: i64,
        user_id: i64,
    ) -> Result<Model, DbErr> {
        let active = ActiveModel {
            project_update_id: Set(project_update_id),
            user_id: Set(user_id),
            read_at: Set(Utc::now()),
        };

        active.insert(db).await
    }

    pub async fn has_read(db: &DbConn, project_update_id: i64, user_id: i64) -> Result<bool, DbErr> {
        let found = Entity::find_by_id((project_update_id, user_id)).one(db).await?;
        Ok(found.is_some())
    }

    pub async fn reader_ids(db: &DbConn, project_update_id: i64) -> Result<Vec<i64>, DbErr> {
        let rows = Entity::find()
            .filter(Column::ProjectUpdateId.eq(project_update_id))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }
}
