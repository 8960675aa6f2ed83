//! SeaORM implementation of SlotRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::slot::{ParkingSlot, SlotRepository, SlotStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::parking_slot;

pub struct SeaOrmSlotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSlotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn model_to_domain(m: parking_slot::Model) -> DomainResult<ParkingSlot> {
    let status = SlotStatus::from_str(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("Unknown slot status '{}' for slot {}", m.status, m.id))
    })?;
    Ok(ParkingSlot {
        id: m.id,
        location_id: m.location_id,
        slot_number: m.slot_number,
        status,
        base_price: m.base_price,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

/// Set a slot's status on any connection, including an open transaction
pub(super) async fn set_slot_status<C: ConnectionTrait>(
    conn: &C,
    slot_id: &str,
    status: SlotStatus,
) -> DomainResult<()> {
    let slot = parking_slot::Entity::find_by_id(slot_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", slot_id))?;

    let mut model: parking_slot::ActiveModel = slot.into();
    model.status = Set(status.as_str().to_string());
    model.updated_at = Set(Utc::now());
    model.update(conn).await?;
    Ok(())
}

// ── SlotRepository impl ─────────────────────────────────────────

#[async_trait]
impl SlotRepository for SeaOrmSlotRepository {
    async fn save(&self, s: ParkingSlot) -> DomainResult<()> {
        debug!("Saving parking slot: {} ({})", s.id, s.slot_number);

        let model = parking_slot::ActiveModel {
            id: Set(s.id),
            location_id: Set(s.location_id),
            slot_number: Set(s.slot_number),
            status: Set(s.status.as_str().to_string()),
            base_price: Set(s.base_price),
            created_at: Set(s.created_at),
            updated_at: Set(s.updated_at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingSlot>> {
        parking_slot::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_all(&self, location_id: Option<&str>) -> DomainResult<Vec<ParkingSlot>> {
        let mut query = parking_slot::Entity::find();
        if let Some(location_id) = location_id {
            query = query.filter(parking_slot::Column::LocationId.eq(location_id));
        }
        let models = query
            .order_by_asc(parking_slot::Column::SlotNumber)
            .all(&self.db)
            .await?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn update_status(&self, id: &str, status: SlotStatus) -> DomainResult<()> {
        debug!("Setting slot {} to {}", id, status);
        set_slot_status(&self.db, id, status).await
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(parking_slot::Entity::find().count(&self.db).await?)
    }
}
