//! Parking location and slot entities

use chrono::{DateTime, Utc};

/// Occupancy state of a single slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    /// Free to be booked
    Available,
    /// Held by a pending or confirmed booking
    Reserved,
    /// A vehicle is checked in
    Occupied,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Reserved => "RESERVED",
            Self::Occupied => "OCCUPIED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(Self::Available),
            "RESERVED" => Some(Self::Reserved),
            "OCCUPIED" => Some(Self::Occupied),
            _ => None,
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parking site grouping a set of slots
#[derive(Debug, Clone)]
pub struct ParkingLocation {
    pub id: String,
    pub name: String,
    pub address: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ParkingLocation {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            address: address.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A single physical parking space
#[derive(Debug, Clone)]
pub struct ParkingSlot {
    pub id: String,
    pub location_id: String,
    /// Label painted on the ground, e.g. "A-12"
    pub slot_number: String,
    pub status: SlotStatus,
    /// Hourly price in the smallest currency unit
    pub base_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingSlot {
    pub fn new(location_id: impl Into<String>, slot_number: impl Into<String>, base_price: i64) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            location_id: location_id.into(),
            slot_number: slot_number.into(),
            status: SlotStatus::Available,
            base_price,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }
}
