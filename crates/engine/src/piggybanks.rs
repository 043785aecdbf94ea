//! The module contains `Piggybank` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// A piggybank.
///
/// A named savings sub-account. `amount_minor` is a materialized projection
/// of the piggybank's transaction log, refreshed by every operation that
/// appends to it. The main piggybank of a user additionally receives the
/// monthly surplus sweep and the balance of deleted siblings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Piggybank {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub target_amount_minor: i64,
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Piggybank {
    pub fn new(
        user_id: String,
        name: String,
        description: Option<String>,
        target_amount_minor: i64,
        is_main: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            description,
            amount_minor: 0,
            target_amount_minor,
            is_main,
            created_at: now,
            updated_at: now,
        }
    }

    /// Progress towards the target, in percent. `0` when no target is set.
    pub fn percentage_to_target(&self) -> f64 {
        if self.target_amount_minor > 0 {
            self.amount_minor as f64 / self.target_amount_minor as f64 * 100.0
        } else {
            0.0
        }
    }

    /// What is still missing to reach the target (never negative).
    pub fn remaining_to_target_minor(&self) -> i64 {
        (self.target_amount_minor - self.amount_minor).max(0)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "piggybanks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub target_amount_minor: i64,
    pub is_main_piggybank: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::piggybank_transactions::Entity")]
    PiggybankTransactions,
}

impl Related<super::piggybank_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PiggybankTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Piggybank> for ActiveModel {
    fn from(value: &Piggybank) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            target_amount_minor: ActiveValue::Set(value.target_amount_minor),
            is_main_piggybank: ActiveValue::Set(value.is_main),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Piggybank {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "piggybank")?,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            amount_minor: model.amount_minor,
            target_amount_minor: model.target_amount_minor,
            is_main: model.is_main_piggybank,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
