use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202608150001_create_users::Migration),
            Box::new(migrations::m202608150002_create_projects::Migration),
            Box::new(migrations::m202608150003_create_project_colleagues::Migration),
            Box::new(migrations::m202608150004_create_project_updates::Migration),
            Box::new(migrations::m202608150005_create_project_update_reads::Migration),
            Box::new(migrations::m202608150006_create_storylines::Migration),
            Box::new(migrations::m202608150007_create_storyline_entries::Migration),
            Box::new(migrations::m202608150008_create_tickets::Migration),
            Box::new(migrations::m202608150009_create_ticket_comments::Migration),
        ]
    }
}
