use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, PiggybankTransaction, PiggybankTransactionCmd, PiggybankTransactionEntry,
    PiggybankTransactionKind, ResultEngine, piggybank_transactions, piggybanks,
    util::{normalize_required_description, parse_uuid, require_positive_amount},
};

use super::{Engine, with_tx};

/// Cached balance of a piggybank next to the balance replayed from its log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerCheck {
    pub piggybank_id: Uuid,
    pub cached_minor: i64,
    pub derived_minor: i64,
}

impl LedgerCheck {
    pub fn is_consistent(&self) -> bool {
        self.cached_minor == self.derived_minor
    }
}

impl Engine {
    /// Append an entry to a piggybank log and apply it to the balance.
    ///
    /// Withdrawals larger than the balance fail with `InsufficientFunds`. A
    /// `Transfer` entry must name another piggybank of the user as source. It
    /// is applied through its signed effect like any entry, so it credits the
    /// target and leaves the source untouched.
    pub async fn new_piggybank_transaction(
        &self,
        cmd: PiggybankTransactionCmd,
    ) -> ResultEngine<PiggybankTransactionEntry> {
        require_positive_amount(cmd.amount_minor, "amount")?;
        let description = normalize_required_description(&cmd.description)?;
        match (cmd.kind, cmd.source_piggybank_id) {
            (PiggybankTransactionKind::Transfer, None) => {
                return Err(EngineError::InvalidId(
                    "transfer entries need a source piggybank".to_string(),
                ));
            }
            (PiggybankTransactionKind::Transfer, Some(source)) if source == cmd.piggybank_id => {
                return Err(EngineError::InvalidAmount(
                    "cannot transfer a piggybank to itself".to_string(),
                ));
            }
            (PiggybankTransactionKind::Transfer, Some(_)) | (_, None) => {}
            (_, Some(_)) => {
                return Err(EngineError::InvalidKind(
                    "only transfer entries can name a source piggybank".to_string(),
                ));
            }
        }

        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let piggybank = self
                .require_piggybank(&db_tx, &cmd.user_id, cmd.piggybank_id)
                .await?;
            let source_name = match cmd.source_piggybank_id {
                Some(source_id) => Some(
                    self.require_piggybank(&db_tx, &cmd.user_id, source_id)
                        .await?
                        .name,
                ),
                None => None,
            };

            if cmd.kind == PiggybankTransactionKind::Withdrawal
                && cmd.amount_minor > piggybank.amount_minor
            {
                return Err(EngineError::InsufficientFunds(format!(
                    "piggybank '{}' holds {}",
                    piggybank.name, piggybank.amount_minor
                )));
            }

            let entry = PiggybankTransaction::new(
                cmd.user_id.clone(),
                cmd.piggybank_id,
                cmd.source_piggybank_id,
                cmd.amount_minor,
                description,
                cmd.kind,
                now,
            )?;
            let piggybank = self.append_log_entry(&db_tx, &piggybank, &entry).await?;

            tracing::debug!(
                user_id = %cmd.user_id,
                piggybank_id = %cmd.piggybank_id,
                kind = entry.kind.as_str(),
                amount_minor = entry.amount_minor,
                "piggybank entry appended"
            );
            Ok(PiggybankTransactionEntry {
                transaction: entry,
                piggybank_name: piggybank.name,
                source_piggybank_name: source_name,
            })
        })
    }

    /// Log of a piggybank, newest first.
    pub async fn list_piggybank_transactions(
        &self,
        user_id: &str,
        piggybank_id: Uuid,
    ) -> ResultEngine<Vec<PiggybankTransactionEntry>> {
        with_tx!(self, |db_tx| {
            let piggybank = self.require_piggybank(&db_tx, user_id, piggybank_id).await?;
            let names = self.piggybank_names(&db_tx, user_id).await?;

            let models = piggybank_transactions::Entity::find()
                .filter(piggybank_transactions::Column::PiggybankId.eq(piggybank.id.clone()))
                .order_by_desc(piggybank_transactions::Column::CreatedAt)
                .order_by_desc(piggybank_transactions::Column::Id)
                .all(&db_tx)
                .await?;

            models
                .into_iter()
                .map(|model| -> ResultEngine<PiggybankTransactionEntry> {
                    let transaction = PiggybankTransaction::try_from(model)?;
                    let source_piggybank_name = transaction
                        .source_piggybank_id
                        .and_then(|id| names.get(&id).cloned());
                    Ok(PiggybankTransactionEntry {
                        transaction,
                        piggybank_name: piggybank.name.clone(),
                        source_piggybank_name,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Replay a piggybank log and compare it with the cached balance.
    pub async fn verify_piggybank_ledger(
        &self,
        user_id: &str,
        piggybank_id: Uuid,
    ) -> ResultEngine<LedgerCheck> {
        with_tx!(self, |db_tx| {
            let piggybank = self.require_piggybank(&db_tx, user_id, piggybank_id).await?;
            let models = piggybank_transactions::Entity::find()
                .filter(piggybank_transactions::Column::PiggybankId.eq(piggybank.id.clone()))
                .all(&db_tx)
                .await?;

            let mut derived_minor: i64 = 0;
            for model in models {
                let entry = PiggybankTransaction::try_from(model)?;
                derived_minor = derived_minor
                    .checked_add(entry.signed_amount_minor())
                    .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
            }

            Ok(LedgerCheck {
                piggybank_id,
                cached_minor: piggybank.amount_minor,
                derived_minor,
            })
        })
    }

    async fn piggybank_names(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<HashMap<Uuid, String>> {
        let models = piggybanks::Entity::find()
            .filter(piggybanks::Column::UserId.eq(user_id.to_string()))
            .all(db)
            .await?;
        models
            .into_iter()
            .map(|model| -> ResultEngine<(Uuid, String)> {
                Ok((parse_uuid(&model.id, "piggybank")?, model.name))
            })
            .collect()
    }
}
