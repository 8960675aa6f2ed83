//! Parking slot entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_slots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub location_id: String,
    pub slot_number: String,

    /// AVAILABLE, RESERVED, OCCUPIED
    pub status: String,

    /// Hourly price in cents
    pub base_price: i64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_location::Entity",
        from = "Column::LocationId",
        to = "super::parking_location::Column::Id"
    )]
    ParkingLocation,
    #[sea_orm(has_many = "super::booking::Entity")]
    Booking,
}

impl Related<super::parking_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingLocation.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
