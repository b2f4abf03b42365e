use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202608150007_create_storyline_entries"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("storyline_entries"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("storyline_id"))
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("seq")).big_integer().not_null())
                    // Optional correlation to a project change-log entry
                    .col(ColumnDef::new(Alias::new("update_id")).big_integer())
                    .col(
                        ColumnDef::new(Alias::new("user_id"))
                            .big_integer()
                            .not_null(),
                    )
                    // Display name captured at write time, not a live reference
                    .col(ColumnDef::new(Alias::new("user_name")).string().not_null())
                    .col(ColumnDef::new(Alias::new("entry_type")).string().not_null())
                    .col(ColumnDef::new(Alias::new("caption")).text().not_null())
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_storyline_entries_storyline")
                            .from(Alias::new("storyline_entries"), Alias::new("storyline_id"))
                            .to(Alias::new("storylines"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_storyline_entries_storyline_seq")
                    .table(Alias::new("storyline_entries"))
                    .col(Alias::new("storyline_id"))
                    .col(Alias::new("seq"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("storyline_entries")).to_owned())
            .await
    }
}
