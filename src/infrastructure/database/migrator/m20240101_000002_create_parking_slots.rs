//! Create parking_slots table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_parking_locations::ParkingLocations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingSlots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingSlots::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingSlots::LocationId).string().not_null())
                    .col(ColumnDef::new(ParkingSlots::SlotNumber).string().not_null())
                    .col(
                        ColumnDef::new(ParkingSlots::Status)
                            .string()
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(
                        ColumnDef::new(ParkingSlots::BasePrice)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingSlots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingSlots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_slots_location")
                            .from(ParkingSlots::Table, ParkingSlots::LocationId)
                            .to(ParkingLocations::Table, ParkingLocations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_slots_location_number")
                    .table(ParkingSlots::Table)
                    .col(ParkingSlots::LocationId)
                    .col(ParkingSlots::SlotNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSlots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingSlots {
    Table,
    Id,
    LocationId,
    SlotNumber,
    Status,
    BasePrice,
    CreatedAt,
    UpdatedAt,
}
