//! SeaORM implementation of BookingRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::payment_repository;
use super::slot_repository::set_slot_status;
use crate::domain::booking::{Booking, BookingRepository, BookingStatus};
use crate::domain::payment::Payment;
use crate::domain::slot::SlotStatus;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, parking_slot, payment};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let status = BookingStatus::from_str(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("Unknown booking status '{}' for booking {}", m.status, m.id))
    })?;
    Ok(Booking {
        id: m.id,
        user_id: m.user_id,
        slot_id: m.slot_id,
        start_time: m.start_time,
        end_time: m.end_time,
        actual_start_time: m.actual_start_time,
        actual_end_time: m.actual_end_time,
        total_amount: m.total_amount,
        status,
        qr_code: m.qr_code,
        check_in_code: m.check_in_code,
        extended_times: m.extended_times,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(b: Booking) -> booking::ActiveModel {
    booking::ActiveModel {
        id: Set(b.id),
        user_id: Set(b.user_id),
        slot_id: Set(b.slot_id),
        start_time: Set(b.start_time),
        end_time: Set(b.end_time),
        actual_start_time: Set(b.actual_start_time),
        actual_end_time: Set(b.actual_end_time),
        total_amount: Set(b.total_amount),
        status: Set(b.status.as_str().to_string()),
        qr_code: Set(b.qr_code),
        check_in_code: Set(b.check_in_code),
        extended_times: Set(b.extended_times),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
    }
}

fn holding_statuses() -> Vec<&'static str> {
    BookingStatus::HOLDING.iter().map(|s| s.as_str()).collect()
}

fn collect(models: Vec<booking::Model>) -> DomainResult<Vec<Booking>> {
    models.into_iter().map(model_to_domain).collect()
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn reserve(&self, b: Booking) -> DomainResult<()> {
        debug!("Reserving slot {} for booking {}", b.slot_id, b.id);

        let txn = self.db.begin().await?;

        let slot = parking_slot::Entity::find_by_id(b.slot_id.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingSlot", "id", &b.slot_id))?;
        if slot.status != SlotStatus::Available.as_str() {
            return Err(DomainError::Conflict(format!(
                "Parking slot {} is not available",
                slot.slot_number
            )));
        }

        let overlapping = booking::Entity::find()
            .filter(booking::Column::SlotId.eq(b.slot_id.as_str()))
            .filter(booking::Column::Status.is_in(holding_statuses()))
            .filter(booking::Column::StartTime.lt(b.end_time))
            .filter(booking::Column::EndTime.gt(b.start_time))
            .count(&txn)
            .await?;
        if overlapping > 0 {
            return Err(DomainError::Conflict(
                "Slot is already booked for the selected time".to_string(),
            ));
        }

        let slot_id = b.slot_id.clone();
        domain_to_active(b).insert(&txn).await?;
        set_slot_status(&txn, &slot_id, SlotStatus::Reserved).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_qr_code(&self, qr_code: &str) -> DomainResult<Option<Booking>> {
        booking::Entity::find()
            .filter(booking::Column::QrCode.eq(qr_code))
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_check_in_code(&self, code: &str) -> DomainResult<Option<Booking>> {
        booking::Entity::find()
            .filter(booking::Column::CheckInCode.eq(code))
            .filter(booking::Column::Status.is_in(holding_statuses()))
            .order_by_desc(booking::Column::CreatedAt)
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> DomainResult<Vec<Booking>> {
        let mut query = booking::Entity::find().filter(booking::Column::UserId.eq(user_id));
        if let Some(status) = status {
            query = query.filter(booking::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await?;
        collect(models)
    }

    async fn find_holding_for_slot(&self, slot_id: &str) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::SlotId.eq(slot_id))
            .filter(booking::Column::Status.is_in(holding_statuses()))
            .order_by_asc(booking::Column::StartTime)
            .all(&self.db)
            .await?;
        collect(models)
    }

    async fn find_by_statuses(&self, statuses: &[BookingStatus]) -> DomainResult<Vec<Booking>> {
        let names: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let models = booking::Entity::find()
            .filter(booking::Column::Status.is_in(names))
            .order_by_asc(booking::Column::StartTime)
            .all(&self.db)
            .await?;
        collect(models)
    }

    async fn update(&self, b: Booking) -> DomainResult<()> {
        debug!("Updating booking {} ({})", b.id, b.status);

        let existing = booking::Entity::find_by_id(b.id.clone())
            .one(&self.db)
            .await?;
        if existing.is_none() {
            return Err(DomainError::not_found("Booking", "id", &b.id));
        }

        domain_to_active(b).update(&self.db).await?;
        Ok(())
    }

    async fn update_with_slot(&self, b: Booking, slot_status: SlotStatus) -> DomainResult<()> {
        debug!(
            "Updating booking {} ({}) with slot {} -> {}",
            b.id, b.status, b.slot_id, slot_status
        );

        let txn = self.db.begin().await?;

        let existing = booking::Entity::find_by_id(b.id.clone()).one(&txn).await?;
        if existing.is_none() {
            return Err(DomainError::not_found("Booking", "id", &b.id));
        }

        let slot_id = b.slot_id.clone();
        domain_to_active(b).update(&txn).await?;
        set_slot_status(&txn, &slot_id, slot_status).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn cancel_with_refund(&self, b: Booking, refunded: Option<Payment>) -> DomainResult<()> {
        debug!(
            "Cancelling booking {} (refunded payment: {:?})",
            b.id,
            refunded.as_ref().map(|p| p.id.as_str())
        );

        let txn = self.db.begin().await?;

        let existing = booking::Entity::find_by_id(b.id.clone()).one(&txn).await?;
        if existing.is_none() {
            return Err(DomainError::not_found("Booking", "id", &b.id));
        }

        let slot_id = b.slot_id.clone();
        domain_to_active(b).update(&txn).await?;
        set_slot_status(&txn, &slot_id, SlotStatus::Available).await?;

        if let Some(p) = refunded {
            let stored = payment::Entity::find_by_id(p.id.clone()).one(&txn).await?;
            if stored.is_none() {
                return Err(DomainError::not_found("Payment", "id", &p.id));
            }
            payment_repository::domain_to_active(p).update(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }
}
