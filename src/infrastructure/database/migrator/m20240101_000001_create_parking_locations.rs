//! Create parking_locations table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingLocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingLocations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingLocations::Name).string().not_null())
                    .col(ColumnDef::new(ParkingLocations::Address).string().not_null())
                    .col(
                        ColumnDef::new(ParkingLocations::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ParkingLocations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingLocations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingLocations {
    Table,
    Id,
    Name,
    Address,
    IsActive,
    CreatedAt,
}
