use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VotesOnchain::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VotesOnchain::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VotesOnchain::DaoId).string().not_null())
                    .col(
                        ColumnDef::new(VotesOnchain::VoterAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VotesOnchain::ProposalId).string().not_null())
                    .col(
                        ColumnDef::new(VotesOnchain::Support)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VotesOnchain::VotingPower)
                            .decimal_len(78, 0)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VotesOnchain::Reason).text())
                    .col(ColumnDef::new(VotesOnchain::TxHash).string().not_null())
                    .col(ColumnDef::new(VotesOnchain::LogIndex).integer().not_null())
                    .col(
                        ColumnDef::new(VotesOnchain::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .index(
                        Index::create()
                            .name("uq_votes_onchain_voter_proposal")
                            .col(VotesOnchain::DaoId)
                            .col(VotesOnchain::ProposalId)
                            .col(VotesOnchain::VoterAccountId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VotesOnchain::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VotesOnchain {
    Table,
    Id,
    DaoId,
    VoterAccountId,
    ProposalId,
    Support,
    VotingPower,
    Reason,
    TxHash,
    LogIndex,
    Timestamp,
}
