use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Delegations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Delegations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Delegations::DaoId).string().not_null())
                    .col(
                        ColumnDef::new(Delegations::DelegatorAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Delegations::DelegateAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Delegations::DelegatedValue)
                            .decimal_len(78, 0)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Delegations::TxHash).string().not_null())
                    .col(ColumnDef::new(Delegations::LogIndex).integer().not_null())
                    .col(
                        ColumnDef::new(Delegations::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Delegations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Delegations {
    Table,
    Id,
    DaoId,
    DelegatorAccountId,
    DelegateAccountId,
    DelegatedValue,
    TxHash,
    LogIndex,
    Timestamp,
}
