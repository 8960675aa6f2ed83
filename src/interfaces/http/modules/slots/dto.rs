//! Slot DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ParkingLocation, ParkingSlot};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SlotListQuery {
    pub location_id: Option<String>,
    /// AVAILABLE, RESERVED or OCCUPIED
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotDto {
    pub id: String,
    pub location_id: String,
    pub slot_number: String,
    pub status: String,
    /// Hourly price in cents
    pub base_price: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<ParkingSlot> for SlotDto {
    fn from(s: ParkingSlot) -> Self {
        Self {
            id: s.id,
            location_id: s.location_id,
            slot_number: s.slot_number,
            status: s.status.as_str().to_string(),
            base_price: s.base_price,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationDto {
    pub id: String,
    pub name: String,
    pub address: String,
    pub is_active: bool,
}

impl From<ParkingLocation> for LocationDto {
    fn from(l: ParkingLocation) -> Self {
        Self {
            id: l.id,
            name: l.name,
            address: l.address,
            is_active: l.is_active,
        }
    }
}
