//! Parking location entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_locations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,
    pub address: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::parking_slot::Entity")]
    ParkingSlot,
}

impl Related<super::parking_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingSlot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
