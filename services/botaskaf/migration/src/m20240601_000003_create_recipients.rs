use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Recipients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Recipients::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Recipients::FormId).integer().not_null())
                    .col(ColumnDef::new(Recipients::FromName).string_len(255).null())
                    .col(ColumnDef::new(Recipients::FromEmail).string_len(255).null())
                    .col(ColumnDef::new(Recipients::ToName).string_len(255).null())
                    .col(ColumnDef::new(Recipients::ToEmail).string_len(255).not_null())
                    .col(ColumnDef::new(Recipients::Subject).string_len(255).not_null())
                    .col(ColumnDef::new(Recipients::Text).text().null())
                    .col(ColumnDef::new(Recipients::Html).text().null())
                    .col(ColumnDef::new(Recipients::Settings).json().not_null())
                    .col(
                        ColumnDef::new(Recipients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Recipients::UpdatedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Recipients::LockedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Recipients::LockedBy).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Recipients::Table, Recipients::FormId)
                            .to(Forms::Table, Forms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Recipients::Table, Recipients::LockedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(Recipients::Table)
                    .col(Recipients::FormId)
                    .col(Recipients::ToEmail)
                    .name("idx_recipients_form_id_to_email")
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Recipients::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Recipients {
    Table,
    Id,
    FormId,
    FromName,
    FromEmail,
    ToName,
    ToEmail,
    Subject,
    Text,
    Html,
    Settings,
    CreatedAt,
    UpdatedAt,
    LockedAt,
    LockedBy,
}

#[derive(Iden)]
enum Forms {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
