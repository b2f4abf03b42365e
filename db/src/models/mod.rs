pub mod project;
pub mod project_colleague;
pub mod project_update;
pub mod project_update_read;
pub mod storyline;
pub mod storyline_entry;
pub mod ticket;
pub mod ticket_comment;
pub mod user;

pub use project::Entity as Project;
pub use project_colleague::Entity as ProjectColleague;
pub use project_update::Entity as ProjectUpdate;
pub use project_update_read::Entity as ProjectUpdateRead;
pub use storyline::Entity as Storyline;
pub use storyline_entry::Entity as StorylineEntry;
pub use ticket::Entity as Ticket;
pub use ticket_comment::Entity as TicketComment;
pub use user::Entity as User;
