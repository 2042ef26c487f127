use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Forms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Forms::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Forms::Uuid)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Forms::UserId).integer().null())
                    .col(ColumnDef::new(Forms::Secret).string_len(64).not_null())
                    .col(ColumnDef::new(Forms::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Forms::Domain).string_len(255).not_null())
                    .col(ColumnDef::new(Forms::Description).text().null())
                    .col(
                        ColumnDef::new(Forms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Forms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Forms::LockedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Forms::LockedBy).integer().null())
                    .col(ColumnDef::new(Forms::Settings).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Forms::Table, Forms::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Forms::Table, Forms::LockedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(Forms::Table)
                    .col(Forms::UserId)
                    .name("idx_forms_user_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Forms::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Forms {
    Table,
    Id,
    Uuid,
    UserId,
    Secret,
    Name,
    Domain,
    Description,
    CreatedAt,
    UpdatedAt,
    LockedAt,
    LockedBy,
    Settings,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
