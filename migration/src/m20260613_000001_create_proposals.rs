use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Proposals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Proposals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Proposals::ProposalId).string().not_null())
                    .col(ColumnDef::new(Proposals::DaoId).string().not_null())
                    .col(
                        ColumnDef::new(Proposals::ProposerAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Proposals::Targets).json().not_null())
                    .col(ColumnDef::new(Proposals::Values).json().not_null())
                    .col(ColumnDef::new(Proposals::Calldatas).json().not_null())
                    .col(ColumnDef::new(Proposals::StartBlock).big_integer().not_null())
                    .col(ColumnDef::new(Proposals::EndBlock).big_integer().not_null())
                    .col(ColumnDef::new(Proposals::Description).text().not_null())
                    .col(
                        ColumnDef::new(Proposals::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Proposals::Status).string().not_null())
                    .col(
                        ColumnDef::new(Proposals::ForVotes)
                            .decimal_len(78, 0)
                            .not_null()
                            .default("0"),
                    )
                    .col(
                        ColumnDef::new(Proposals::AgainstVotes)
                            .decimal_len(78, 0)
                            .not_null()
                            .default("0"),
                    )
                    .col(
                        ColumnDef::new(Proposals::AbstainVotes)
                            .decimal_len(78, 0)
                            .not_null()
                            .default("0"),
                    )
                    .index(
                        Index::create()
                            .name("uq_proposals_dao_proposal")
                            .col(Proposals::DaoId)
                            .col(Proposals::ProposalId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Proposals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Proposals {
    Table,
    Id,
    ProposalId,
    DaoId,
    ProposerAccountId,
    Targets,
    Values,
    Calldatas,
    StartBlock,
    EndBlock,
    Description,
    Timestamp,
    Status,
    ForVotes,
    AgainstVotes,
    AbstainVotes,
}
