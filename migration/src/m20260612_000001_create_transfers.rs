use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::TxHash).string().not_null())
                    .col(ColumnDef::new(Transfers::LogIndex).integer().not_null())
                    .col(ColumnDef::new(Transfers::DaoId).string().not_null())
                    .col(ColumnDef::new(Transfers::TokenId).string().not_null())
                    .col(ColumnDef::new(Transfers::FromAddress).string().not_null())
                    .col(ColumnDef::new(Transfers::ToAddress).string().not_null())
                    .col(
                        ColumnDef::new(Transfers::Amount)
                            .decimal_len(78, 0)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .index(
                        Index::create()
                            .name("uq_transfers_tx_hash_log_index")
                            .col(Transfers::TxHash)
                            .col(Transfers::LogIndex)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Transfers {
    Table,
    Id,
    TxHash,
    LogIndex,
    DaoId,
    TokenId,
    FromAddress,
    ToAddress,
    Amount,
    Timestamp,
}
