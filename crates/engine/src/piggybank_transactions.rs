//! Piggybank transaction log.
//!
//! Every balance-affecting operation on a piggybank appends one
//! `PiggybankTransaction`. Entries are never edited; they are removed only
//! together with their piggybank, or (for `MonthlyBalance` entries of the main
//! piggybank) when the monthly balance is recomputed.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiggybankTransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
    MonthlyBalance,
}

impl PiggybankTransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
            Self::MonthlyBalance => "monthly_balance",
        }
    }
}

impl TryFrom<&str> for PiggybankTransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "transfer" => Ok(Self::Transfer),
            "monthly_balance" => Ok(Self::MonthlyBalance),
            other => Err(EngineError::InvalidKind(format!(
                "invalid piggybank transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PiggybankTransaction {
    pub id: Uuid,
    pub user_id: String,
    /// The piggybank whose balance this entry affects.
    pub piggybank_id: Uuid,
    /// The peer piggybank of an incoming transfer.
    pub source_piggybank_id: Option<Uuid>,
    pub amount_minor: i64,
    pub description: String,
    pub kind: PiggybankTransactionKind,
    pub created_at: DateTime<Utc>,
}

impl PiggybankTransaction {
    pub fn new(
        user_id: String,
        piggybank_id: Uuid,
        source_piggybank_id: Option<Uuid>,
        amount_minor: i64,
        description: String,
        kind: PiggybankTransactionKind,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            piggybank_id,
            source_piggybank_id,
            amount_minor,
            description,
            kind,
            created_at,
        })
    }

    /// Effect of this entry on its piggybank balance.
    ///
    /// A `Transfer` entry is incoming when it names a source piggybank and
    /// outgoing otherwise.
    pub fn signed_amount_minor(&self) -> i64 {
        match self.kind {
            PiggybankTransactionKind::Deposit | PiggybankTransactionKind::MonthlyBalance => {
                self.amount_minor
            }
            PiggybankTransactionKind::Withdrawal => -self.amount_minor,
            PiggybankTransactionKind::Transfer => match self.source_piggybank_id {
                Some(_) => self.amount_minor,
                None => -self.amount_minor,
            },
        }
    }
}

/// A log entry together with the display names of the piggybanks it
/// references. The source name is `None` when there is no source or the
/// source piggybank has been deleted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PiggybankTransactionEntry {
    pub transaction: PiggybankTransaction,
    pub piggybank_name: String,
    pub source_piggybank_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "piggybank_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub piggybank_id: String,
    pub source_piggybank_id: Option<String>,
    pub amount_minor: i64,
    pub description: String,
    pub kind: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::piggybanks::Entity",
        from = "Column::PiggybankId",
        to = "super::piggybanks::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Piggybanks,
}

impl Related<super::piggybanks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Piggybanks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&PiggybankTransaction> for ActiveModel {
    fn from(tx: &PiggybankTransaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            piggybank_id: ActiveValue::Set(tx.piggybank_id.to_string()),
            source_piggybank_id: ActiveValue::Set(
                tx.source_piggybank_id.map(|id| id.to_string()),
            ),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            description: ActiveValue::Set(tx.description.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for PiggybankTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "piggybank transaction")?,
            user_id: model.user_id,
            piggybank_id: parse_uuid(&model.piggybank_id, "piggybank")?,
            source_piggybank_id: model
                .source_piggybank_id
                .as_deref()
                .map(|id| parse_uuid(id, "source piggybank"))
                .transpose()?,
            amount_minor: model.amount_minor,
            description: model.description,
            kind: PiggybankTransactionKind::try_from(model.kind.as_str())?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn entry(kind: PiggybankTransactionKind, source: Option<Uuid>) -> PiggybankTransaction {
        PiggybankTransaction::new(
            "alice".to_string(),
            Uuid::new_v4(),
            source,
            40_00,
            "test".to_string(),
            kind,
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn kind_codec() {
        for kind in [
            PiggybankTransactionKind::Deposit,
            PiggybankTransactionKind::Withdrawal,
            PiggybankTransactionKind::Transfer,
            PiggybankTransactionKind::MonthlyBalance,
        ] {
            assert_eq!(PiggybankTransactionKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(PiggybankTransactionKind::try_from("refund").is_err());
    }

    #[test]
    fn signed_effects() {
        use PiggybankTransactionKind::*;

        assert_eq!(entry(Deposit, None).signed_amount_minor(), 40_00);
        assert_eq!(entry(MonthlyBalance, None).signed_amount_minor(), 40_00);
        assert_eq!(entry(Withdrawal, None).signed_amount_minor(), -40_00);
        assert_eq!(entry(Transfer, None).signed_amount_minor(), -40_00);
        assert_eq!(
            entry(Transfer, Some(Uuid::new_v4())).signed_amount_minor(),
            40_00
        );
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let err = PiggybankTransaction::new(
            "alice".to_string(),
            Uuid::new_v4(),
            None,
            0,
            "zero".to_string(),
            PiggybankTransactionKind::Deposit,
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }
}
