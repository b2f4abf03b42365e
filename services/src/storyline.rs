use chrono::Utc;
use db::models::{
    storyline, storyline_entry,
    ticket::{self, NewTicket},
};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DbConn, EntityTrait};

use crate::auth::AuthUser;
use crate::error::{ServiceError, ServiceResult};

/// Entry type for the first entry of every storyline.
pub const ENTRY_CREATION: &str = "CREATION";
/// Entry type recorded when a comment is added.
pub const ENTRY_COMMENT: &str = "COMMENT";

/// Per-ticket history of human-readable update captions. Independent
/// of the project change log, with its own dense sequence numbers.
pub struct StorylineLog;

impl StorylineLog {
    /// Deterministic summary of a ticket's initial state, written as
    /// the CREATION caption.
    pub fn creation_caption(fields: &NewTicket) -> String {
        format!(
            "created a new ticket with\ntitle: {}\nbody: {}\nstatus: {}\nurgency: {}",
            fields.title, fields.body, fields.status, fields.urgency
        )
    }

    /// Builds a storyline with its CREATION entry. Runs before the
    /// ticket row is inserted; the ticket then stores the returned id.
    pub async fn create(
        db: &DbConn,
        project_id: i64,
        actor: &AuthUser,
        fields: &NewTicket,
    ) -> ServiceResult<storyline::Model> {
        let line = storyline::Model::create(db, project_id).await?;
        storyline_entry::Model::create(
            db,
            line.id,
            0,
            None,
            actor.id,
            &actor.name,
            ENTRY_CREATION,
            &Self::creation_caption(fields),
        )
        .await?;
        Ok(line)
    }

    /// Prepends an entry to the ticket's storyline and returns the
    /// refreshed ticket.
    ///
    /// A missing storyline row means the ticket points at history that
    /// no longer exists; that is data corruption and fails `NotFound`
    /// rather than silently recreating the storyline.
    pub async fn append_update(
        db: &DbConn,
        ticket: &ticket::Model,
        actor: &AuthUser,
        entry_type: &str,
        caption: &str,
        update_id: Option<i64>,
    ) -> ServiceResult<ticket::Model> {
        let line = storyline::Entity::find_by_id(ticket.storyline_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("storyline"))?;

        let next_seq = storyline_entry::Model::newest_for_storyline(db, line.id)
            .await?
            .map_or(0, |newest| newest.seq + 1);

        storyline_entry::Model::create(
            db,
            line.id,
            next_seq,
            update_id,
            actor.id,
            &actor.name,
            entry_type,
            caption,
        )
        .await?;

        let mut active: ticket::ActiveModel = ticket.clone().into();
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project_flow::{NewProject, ProjectFlow};
    use db::models::user;
    use db::test_utils::setup_test_db;

    fn sample_fields() -> NewTicket {
        NewTicket {
            title: "Printer on fire".into(),
            body: "Third floor printer is smoking".into(),
            status: "open".into(),
            urgency: "high".into(),
            department: "facilities".into(),
            ticket_type: "incident".into(),
        }
    }

    async fn seed(db: &DbConn) -> (i64, AuthUser) {
        let leader = user::Model::create(db, "lead", "lead@example.com")
            .await
            .unwrap();
        let actor = AuthUser::from(&leader);
        let project = ProjectFlow::create(db, &actor, NewProject::named("Helpdesk", "pw"))
            .await
            .unwrap();
        (project.id, actor)
    }

    #[tokio::test]
    async fn test_create_writes_the_creation_entry() {
        let db = setup_test_db().await;
        let (project_id, actor) = seed(&db).await;

        let line = StorylineLog::create(&db, project_id, &actor, &sample_fields())
            .await
            .unwrap();

        let entries = storyline_entry::Model::find_all_for_storyline(&db, line.id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].seq, 0);
        assert_eq!(entries[0].entry_type, ENTRY_CREATION);
        assert_eq!(entries[0].user_name, "lead");
        assert!(entries[0].caption.contains("Printer on fire"));
        assert!(entries[0].caption.contains("urgency: high"));
    }

    #[tokio::test]
    async fn test_append_update_prepends_with_next_seq() {
        let db = setup_test_db().await;
        let (project_id, actor) = seed(&db).await;
        let fields = sample_fields();

        let line = StorylineLog::create(&db, project_id, &actor, &fields)
            .await
            .unwrap();
        let ticket = ticket::Model::create(&db, project_id, actor.id, 1, line.id, &fields)
            .await
            .unwrap();

        let updated = StorylineLog::append_update(
            &db,
            &ticket,
            &actor,
            "STATUS",
            "moved the ticket to in_progress",
            Some(2),
        )
        .await
        .unwrap();
        assert!(updated.updated_at >= ticket.updated_at);

        let entries = storyline_entry::Model::find_all_for_storyline(&db, line.id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        // Newest first.
        assert_eq!(entries[0].seq, 1);
        assert_eq!(entries[0].entry_type, "STATUS");
        assert_eq!(entries[0].update_id, Some(2));
        assert_eq!(entries[1].seq, 0);
    }

    #[tokio::test]
    async fn test_append_update_fails_on_missing_storyline() {
        let db = setup_test_db().await;
        let (project_id, actor) = seed(&db).await;
        let fields = sample_fields();

        let line = StorylineLog::create(&db, project_id, &actor, &fields)
            .await
            .unwrap();
        let mut ticket = ticket::Model::create(&db, project_id, actor.id, 1, line.id, &fields)
            .await
            .unwrap();
        // Point the ticket at history that does not exist.
        ticket.storyline_id = 9999;

        let err = StorylineLog::append_update(&db, &ticket, &actor, "STATUS", "x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
