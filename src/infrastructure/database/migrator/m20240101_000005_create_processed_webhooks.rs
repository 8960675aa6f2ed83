//! Create processed_webhooks table
//!
//! One row per applied provider callback; the unique (provider, event_key)
//! index is what rejects replays.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProcessedWebhooks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProcessedWebhooks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProcessedWebhooks::Provider).string().not_null())
                    .col(ColumnDef::new(ProcessedWebhooks::EventKey).string().not_null())
                    .col(ColumnDef::new(ProcessedWebhooks::PaymentId).string().not_null())
                    .col(
                        ColumnDef::new(ProcessedWebhooks::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_processed_webhooks_provider_key")
                    .table(ProcessedWebhooks::Table)
                    .col(ProcessedWebhooks::Provider)
                    .col(ProcessedWebhooks::EventKey)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProcessedWebhooks::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ProcessedWebhooks {
    Table,
    Id,
    Provider,
    EventKey,
    PaymentId,
    ReceivedAt,
}
