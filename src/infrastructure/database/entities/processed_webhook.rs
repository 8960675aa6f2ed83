//! Processed webhook entity (replay protection)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "processed_webhooks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Provider slug: telebirr, cbe, chapa
    pub provider: String,
    /// Provider transaction id, or reference + outcome when none is sent
    pub event_key: String,
    pub payment_id: String,
    pub received_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
