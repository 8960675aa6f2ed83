//! SeaORM implementation of PaymentRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};

use crate::domain::payment::{
    Payment, PaymentMethod, PaymentRepository, PaymentStatus, ProcessedWebhook,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{payment, processed_webhook};

pub struct SeaOrmPaymentRepository {
    db: DatabaseConnection,
}

impl SeaOrmPaymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: payment::Model) -> DomainResult<Payment> {
    let method = PaymentMethod::from_str(&m.method).ok_or_else(|| {
        DomainError::Storage(format!("Unknown payment method '{}' for payment {}", m.method, m.id))
    })?;
    let status = PaymentStatus::from_str(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("Unknown payment status '{}' for payment {}", m.status, m.id))
    })?;
    Ok(Payment {
        id: m.id,
        booking_id: m.booking_id,
        user_id: m.user_id,
        amount: m.amount,
        method,
        status,
        transaction_id: m.transaction_id,
        gateway_response: m.gateway_response,
        paid_at: m.paid_at,
        refunded_at: m.refunded_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub(super) fn domain_to_active(p: Payment) -> payment::ActiveModel {
    payment::ActiveModel {
        id: Set(p.id),
        booking_id: Set(p.booking_id),
        user_id: Set(p.user_id),
        amount: Set(p.amount),
        method: Set(p.method.as_str().to_string()),
        status: Set(p.status.as_str().to_string()),
        transaction_id: Set(p.transaction_id),
        gateway_response: Set(p.gateway_response),
        paid_at: Set(p.paid_at),
        refunded_at: Set(p.refunded_at),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    }
}

// ── PaymentRepository impl ──────────────────────────────────────

#[async_trait]
impl PaymentRepository for SeaOrmPaymentRepository {
    async fn save(&self, p: Payment) -> DomainResult<()> {
        debug!("Saving payment {} for booking {}", p.id, p.booking_id);
        domain_to_active(p).insert(&self.db).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Payment>> {
        payment::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn update(&self, p: Payment) -> DomainResult<()> {
        debug!("Updating payment {} ({})", p.id, p.status);

        let existing = payment::Entity::find_by_id(p.id.clone())
            .one(&self.db)
            .await?;
        if existing.is_none() {
            return Err(DomainError::not_found("Payment", "id", &p.id));
        }

        domain_to_active(p).update(&self.db).await?;
        Ok(())
    }

    async fn find_by_booking(&self, booking_id: &str) -> DomainResult<Vec<Payment>> {
        let models = payment::Entity::find()
            .filter(payment::Column::BookingId.eq(booking_id))
            .order_by_desc(payment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn find_by_status(&self, status: PaymentStatus) -> DomainResult<Vec<Payment>> {
        let models = payment::Entity::find()
            .filter(payment::Column::Status.eq(status.as_str()))
            .order_by_asc(payment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn record_webhook(&self, w: ProcessedWebhook) -> DomainResult<bool> {
        let model = processed_webhook::ActiveModel {
            provider: Set(w.provider.slug().to_string()),
            event_key: Set(w.event_key),
            payment_id: Set(w.payment_id),
            received_at: Set(w.received_at),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(_) => Ok(true),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(false),
                _ => Err(e.into()),
            },
        }
    }

    async fn forget_webhook(&self, provider: &str, event_key: &str) -> DomainResult<()> {
        processed_webhook::Entity::delete_many()
            .filter(processed_webhook::Column::Provider.eq(provider))
            .filter(processed_webhook::Column::EventKey.eq(event_key))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
