pub mod m202608150001_create_users;
pub mod m202608150002_create_projects;
pub mod m202608150003_create_project_colleagues;
pub mod m202608150004_create_project_updates;
pub mod m202608150005_create_project_update_reads;
pub mod m202608150006_create_storylines;
pub mod m202608150007_create_storyline_entries;
pub mod m202608150008_create_tickets;
pub mod m202608150009_create_ticket_comments;
