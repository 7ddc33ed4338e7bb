use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BalanceHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BalanceHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BalanceHistory::TxHash).string().not_null())
                    .col(
                        ColumnDef::new(BalanceHistory::LogIndex)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BalanceHistory::DaoId).string().not_null())
                    .col(
                        ColumnDef::new(BalanceHistory::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceHistory::Balance)
                            .decimal_len(78, 0)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceHistory::Delta)
                            .decimal_len(78, 0)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BalanceHistory::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BalanceHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BalanceHistory {
    Table,
    Id,
    TxHash,
    LogIndex,
    DaoId,
    AccountId,
    Balance,
    Delta,
    Timestamp,
}
