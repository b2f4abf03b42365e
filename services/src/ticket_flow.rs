use db::models::{
    project,
    project_update::UpdateType,
    storyline,
    ticket::{self, NewTicket},
    ticket_comment,
};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DbConn, EntityTrait};

use crate::auth::AuthUser;
use crate::change_log::ChangeLog;
use crate::error::{ServiceError, ServiceResult};
use crate::membership::MembershipGuard;
use crate::storyline::{ENTRY_COMMENT, StorylineLog};
use crate::ticket_counter::TicketCounter;

/// Field changes for a ticket update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TicketChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
    pub urgency: Option<String>,
    pub department: Option<String>,
    pub ticket_type: Option<String>,
}

/// Caller-supplied storyline caption describing a ticket update.
#[derive(Debug, Clone)]
pub struct UpdateNote {
    pub entry_type: String,
    pub caption: String,
}

/// Ticket mutations, wired through the guard, counter, storyline and
/// change log in that order. Each returns the `update_id` of the
/// change-log entry so the caller can confirm the client's sync point.
pub struct TicketFlow;

impl TicketFlow {
    pub async fn create(
        db: &DbConn,
        project_id: i64,
        actor: &AuthUser,
        fields: NewTicket,
    ) -> ServiceResult<(ticket::Model, i64)> {
        let project = project::Entity::find_by_id(project_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("project"))?;
        MembershipGuard::ensure_member(db, &project, actor.id).await?;

        let tid = TicketCounter::next(db, project_id).await?;
        let line = StorylineLog::create(db, project_id, actor, &fields).await?;
        let created = ticket::Model::create(db, project_id, actor.id, tid, line.id, &fields).await?;

        let update_id = ChangeLog::append(
            db,
            project_id,
            Some(created.id),
            UpdateType::CreateTicket,
            actor,
        )
        .await?;

        tracing::info!(project_id, ticket_id = created.id, tid, update_id, "created ticket");
        Ok((created, update_id))
    }

    pub async fn update(
        db: &DbConn,
        ticket_id: i64,
        actor: &AuthUser,
        changes: TicketChanges,
        note: UpdateNote,
    ) -> ServiceResult<(ticket::Model, i64)> {
        let existing = Self::find_owned(db, ticket_id, actor).await?;

        let mut active: ticket::ActiveModel = existing.clone().into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(body) = changes.body {
            active.body = Set(body);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(urgency) = changes.urgency {
            active.urgency = Set(urgency);
        }
        if let Some(department) = changes.department {
            active.department = Set(department);
        }
        if let Some(ticket_type) = changes.ticket_type {
            active.ticket_type = Set(ticket_type);
        }
        let changed = active.update(db).await?;

        let update_id = ChangeLog::append(
            db,
            changed.project_id,
            Some(changed.id),
            UpdateType::UpdateTicket,
            actor,
        )
        .await?;

        let updated = StorylineLog::append_update(
            db,
            &changed,
            actor,
            &note.entry_type,
            &note.caption,
            Some(update_id),
        )
        .await?;

        Ok((updated, update_id))
    }

    /// Adds a comment, captured with the author's display name, and
    /// records it as a ticket update in both histories.
    pub async fn comment(
        db: &DbConn,
        ticket_id: i64,
        actor: &AuthUser,
        text: &str,
    ) -> ServiceResult<(ticket::Model, i64)> {
        let existing = Self::find_owned(db, ticket_id, actor).await?;

        ticket_comment::Model::create(db, existing.id, actor.id, &actor.name, text).await?;

        let update_id = ChangeLog::append(
            db,
            existing.project_id,
            Some(existing.id),
            UpdateType::UpdateTicket,
            actor,
        )
        .await?;

        let updated =
            StorylineLog::append_update(db, &existing, actor, ENTRY_COMMENT, text, Some(update_id))
                .await?;

        Ok((updated, update_id))
    }

    /// Deletes a ticket and its storyline. The project's change-log
    /// entries referencing the ticket stay in place so disconnected
    /// clients still learn about the deletion.
    pub async fn delete(
        db: &DbConn,
        ticket_id: i64,
        actor: &AuthUser,
    ) -> ServiceResult<(ticket::Model, i64)> {
        let existing = Self::find_owned(db, ticket_id, actor).await?;

        ticket::Model::delete(db, existing.id).await?;
        storyline::Model::delete(db, existing.storyline_id).await?;

        let update_id = ChangeLog::append(
            db,
            existing.project_id,
            Some(existing.id),
            UpdateType::DeleteTicket,
            actor,
        )
        .await?;

        tracing::info!(
            project_id = existing.project_id,
            ticket_id = existing.id,
            update_id,
            "deleted ticket"
        );
        Ok((existing, update_id))
    }

    async fn find_owned(
        db: &DbConn,
        ticket_id: i64,
        actor: &AuthUser,
    ) -> ServiceResult<ticket::Model> {
        let found = ticket::Entity::find_by_id(ticket_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("ticket"))?;
        if found.user_id != actor.id {
            return Err(ServiceError::Unauthorized);
        }
        Ok(found)
    }
}
