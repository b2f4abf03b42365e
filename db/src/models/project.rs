use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter, prelude::Expr};
use serde::{Deserialize, Serialize};

/// Represents a project in the `projects` table.
///
/// The two counters on this row are the serialization points for all
/// per-project sequencing:
/// - `ticket_count` backs the dense per-project ticket display numbers,
/// - `latest_update_id` is the head of the project's change log.
///
/// Both advance only through the compare-and-swap helpers below, never
/// through a plain read-modify-write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    /// Public join code shared with colleagues, distinct from `id`.
    pub join_code: String,
    /// Join password, compared with plain equality.
    pub password: String,

    pub leader_id: i64,

    /// Free-form category lists configured at creation time.
    #[sea_orm(column_type = "JsonBinary")]
    pub departments: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub ticket_types: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub statuses: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub urgencies: Json,

    pub ticket_count: i64,
    pub latest_update_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LeaderId",
        to = "super::user::Column::Id"
    )]
    Leader,

    #[sea_orm(has_many = "super::ticket::Entity")]
    Ticket,

    #[sea_orm(has_many = "super::project_update::Entity")]
    ProjectUpdate,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leader.def()
    }
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ticket.def()
    }
}

impl Related<super::project_update::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectUpdate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[allow(clippy::too_many_arguments)]
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        name: &str,
        join_code: &str,
        password: &str,
        leader_id: i64,
        departments: Vec<String>,
        ticket_types: Vec<String>,
        statuses: Vec<String>,
        urgencies: Vec<String>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();

        let active = ActiveModel {
            name: Set(name.to_owned()),
            join_code: Set(join_code.to_owned()),
            password: Set(password.to_owned()),
            leader_id: Set(leader_id),
            departments: Set(serde_json::json!(departments)),
            ticket_types: Set(serde_json::json!(ticket_types)),
            statuses: Set(serde_json::json!(statuses)),
            urgencies: Set(serde_json::json!(urgencies)),
            ticket_count: Set(0),
            latest_update_id: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(db).await
    }

    pub async fn find_by_join_code(db: &DbConn, join_code: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::JoinCode.eq(join_code))
            .one(db)
            .await
    }

    pub async fn find_led_by(db: &DbConn, user_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::LeaderId.eq(user_id))
            .all(db)
            .await
    }

    /// Advances `latest_update_id` from `current` to `current + 1`.
    ///
    /// Returns `false` when another writer advanced the counter first;
    /// the caller re-reads and retries.
    pub async fn try_advance_latest_update<C: ConnectionTrait>(
        db: &C,
        project_id: i64,
        current: i64,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::LatestUpdateId, Expr::value(current + 1))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(project_id))
            .filter(Column::LatestUpdateId.eq(current))
            .exec(db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Advances `ticket_count` from `current` to `current + 1`, same
    /// conditional-write contract as [`Model::try_advance_latest_update`].
    pub async fn try_advance_ticket_count(
        db: &DbConn,
        project_id: i64,
        current: i64,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::TicketCount, Expr::value(current + 1))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(project_id))
            .filter(Column::TicketCount.eq(current))
            .exec(db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Generates a random 8-character alphanumeric join code.
    pub fn generate_join_code() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect()
    }
}
