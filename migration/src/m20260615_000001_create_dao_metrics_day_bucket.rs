use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DaoMetricsDayBucket::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DaoMetricsDayBucket::Date).date().not_null())
                    .col(ColumnDef::new(DaoMetricsDayBucket::DaoId).string().not_null())
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::TokenId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::MetricType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::Open)
                            .decimal_len(78, 18)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::Close)
                            .decimal_len(78, 18)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::Low)
                            .decimal_len(78, 18)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::High)
                            .decimal_len(78, 18)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::Average)
                            .decimal_len(78, 18)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::Volume)
                            .decimal_len(78, 18)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DaoMetricsDayBucket::Count)
                            .big_integer()
                            .not_null(),
                    )
                    .index(
                        Index::create()
                            .name("uq_day_bucket_date_dao_metric")
                            .col(DaoMetricsDayBucket::Date)
                            .col(DaoMetricsDayBucket::DaoId)
                            .col(DaoMetricsDayBucket::MetricType)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DaoMetricsDayBucket::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DaoMetricsDayBucket {
    Table,
    Id,
    Date,
    DaoId,
    TokenId,
    MetricType,
    Open,
    Close,
    Low,
    High,
    Average,
    Volume,
    Count,
}
