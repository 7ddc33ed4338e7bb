use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_balance_history_account_ts")
                    .table(BalanceHistory::Table)
                    .col(BalanceHistory::AccountId)
                    .col(BalanceHistory::Timestamp)
                    .col(BalanceHistory::LogIndex)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_voting_power_history_account_ts")
                    .table(VotingPowerHistory::Table)
                    .col(VotingPowerHistory::AccountId)
                    .col(VotingPowerHistory::Timestamp)
                    .col(VotingPowerHistory::LogIndex)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_from_ts")
                    .table(Transfers::Table)
                    .col(Transfers::FromAddress)
                    .col(Transfers::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_to_ts")
                    .table(Transfers::Table)
                    .col(Transfers::ToAddress)
                    .col(Transfers::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_balance_history_account_ts")
                    .table(BalanceHistory::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_voting_power_history_account_ts")
                    .table(VotingPowerHistory::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_transfers_from_ts")
                    .table(Transfers::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_transfers_to_ts")
                    .table(Transfers::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum BalanceHistory {
    Table,
    AccountId,
    Timestamp,
    LogIndex,
}

#[derive(DeriveIden)]
enum VotingPowerHistory {
    Table,
    AccountId,
    Timestamp,
    LogIndex,
}

#[derive(DeriveIden)]
enum Transfers {
    Table,
    FromAddress,
    ToAddress,
    Timestamp,
}
