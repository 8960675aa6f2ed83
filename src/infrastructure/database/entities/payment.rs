//! Payment entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub booking_id: String,
    pub user_id: String,

    /// Amount in cents
    pub amount: i64,

    /// TELEBIRR, CBE_BIRR, CHAPA, CASH
    pub method: String,

    /// PENDING, PROCESSING, COMPLETED, FAILED, REFUNDED
    pub status: String,

    #[sea_orm(nullable)]
    pub transaction_id: Option<String>,

    /// Raw provider response (JSON)
    #[sea_orm(column_type = "Text", nullable)]
    pub gateway_response: Option<String>,

    #[sea_orm(nullable)]
    pub paid_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub refunded_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::Id"
    )]
    Booking,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
