use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{QueryFilter, QueryOrder};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One caption in a ticket's storyline.
///
/// The acting user's display name is captured at write time on
/// purpose: history must keep showing the name the user had when the
/// entry was written, even if they rename later.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storyline_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub storyline_id: i64,

    /// Dense per-storyline sequence number, 0 for the CREATION entry.
    pub seq: i64,
    /// Correlated change-log `update_id`, when the caption came from a
    /// logged mutation.
    pub update_id: Option<i64>,

    pub user_id: i64,
    pub user_name: String,

    /// CREATION, COMMENT, or a caller-supplied update type.
    pub entry_type: String,
    pub caption: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::storyline::Entity",
        from = "Column::StorylineId",
        to = "super::storyline::Column::Id"
    )]
    Storyline,
}

impl Related<super::storyline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Storyline.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &DbConn,
        storyline_id: i64,
        seq: i64,
        update_id: Option<i64>,
        user_id: i64,
        user_name: &str,
        entry_type: &str,
        caption: &str,
    ) -> Result<Model, DbErr> {
        let active = ActiveModel {
            storyline_id: Set(storyline_id),
            seq: Set(seq),
            update_id: Set(update_id),
            user_id: Set(user_id),
            user_name: Set(user_name.to_owned()),
            entry_type: Set(entry_type.to_owned()),
            caption: Set(caption.to_owned()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active.insert(db).await
    }

    /// Entries for one storyline, newest first.
    pub async fn find_all_for_storyline(
        db: &DbConn,
        storyline_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::StorylineId.eq(storyline_id))
            .order_by_desc(Column::Seq)
            .all(db)
            .await
    }

    pub async fn newest_for_storyline(
        db: &DbConn,
        storyline_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::StorylineId.eq(storyline_id))
            .order_by_desc(Column::Seq)
            .one(db)
            .await
    }
}
