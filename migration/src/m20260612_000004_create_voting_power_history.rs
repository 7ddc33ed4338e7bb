use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VotingPowerHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VotingPowerHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VotingPowerHistory::TxHash)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingPowerHistory::LogIndex)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VotingPowerHistory::DaoId).string().not_null())
                    .col(
                        ColumnDef::new(VotingPowerHistory::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingPowerHistory::VotingPower)
                            .decimal_len(78, 0)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingPowerHistory::Delta)
                            .decimal_len(78, 0)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotingPowerHistory::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VotingPowerHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VotingPowerHistory {
    Table,
    Id,
    TxHash,
    LogIndex,
    DaoId,
    AccountId,
    VotingPower,
    Delta,
    Timestamp,
}
