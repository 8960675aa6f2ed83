//! Booking entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,
    pub slot_id: String,

    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,

    #[sea_orm(nullable)]
    pub actual_start_time: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub actual_end_time: Option<DateTimeUtc>,

    /// Amount owed in cents
    pub total_amount: i64,

    /// PENDING, CONFIRMED, ACTIVE, COMPLETED, CANCELLED, EXPIRED
    pub status: String,

    #[sea_orm(unique)]
    pub qr_code: String,
    pub check_in_code: String,

    pub extended_times: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_slot::Entity",
        from = "Column::SlotId",
        to = "super::parking_slot::Column::Id"
    )]
    ParkingSlot,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<super::parking_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingSlot.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
