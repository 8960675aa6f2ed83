//! SeaORM implementation of LocationRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::domain::slot::{LocationRepository, ParkingLocation};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::parking_location;

pub struct SeaOrmLocationRepository {
    db: DatabaseConnection,
}

impl SeaOrmLocationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: parking_location::Model) -> ParkingLocation {
    ParkingLocation {
        id: m.id,
        name: m.name,
        address: m.address,
        is_active: m.is_active,
        created_at: m.created_at,
    }
}

#[async_trait]
impl LocationRepository for SeaOrmLocationRepository {
    async fn save(&self, l: ParkingLocation) -> DomainResult<()> {
        debug!("Saving parking location: {}", l.id);

        let model = parking_location::ActiveModel {
            id: Set(l.id),
            name: Set(l.name),
            address: Set(l.address),
            is_active: Set(l.is_active),
            created_at: Set(l.created_at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<ParkingLocation>> {
        let model = parking_location::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingLocation>> {
        let models = parking_location::Entity::find()
            .order_by_asc(parking_location::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
