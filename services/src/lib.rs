pub mod auth;
pub mod change_log;
pub mod error;
pub mod join;
pub mod membership;
pub mod project_flow;
pub mod storyline;
pub mod ticket_counter;
pub mod ticket_flow;
