use chrono::Utc;
use sea_orm::TransactionTrait;
use serde::Serialize;

use crate::{
    EngineError, PiggybankTransaction, PiggybankTransactionKind, ResultEngine, TransferCmd,
    util::{MAX_DESCRIPTION_LEN, normalize_optional_text, require_positive_amount},
};

use super::{Engine, with_tx};

/// Both sides of a transfer and the resulting balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    /// Entry on the source piggybank (no source id, debits).
    pub outgoing: PiggybankTransaction,
    /// Entry on the destination piggybank (names the source, credits).
    pub incoming: PiggybankTransaction,
    pub source_name: String,
    pub destination_name: String,
    pub source_amount_minor: i64,
    pub destination_amount_minor: i64,
}

fn transfer_description(direction: &str, peer: &str, note: Option<&str>) -> String {
    match note {
        Some(note) => format!("transfer {direction} {peer} - {note}"),
        None => format!("transfer {direction} {peer}"),
    }
}

impl Engine {
    /// Move money from one piggybank to another.
    ///
    /// Debit and credit are written in one DB transaction, so the sum of the
    /// two balances is unchanged.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        require_positive_amount(cmd.amount_minor, "amount")?;
        if cmd.source_piggybank_id == cmd.destination_piggybank_id {
            return Err(EngineError::InvalidAmount(
                "cannot transfer a piggybank to itself".to_string(),
            ));
        }
        let note = normalize_optional_text(Some(&cmd.description));
        if note
            .as_ref()
            .is_some_and(|note| note.chars().count() > MAX_DESCRIPTION_LEN)
        {
            return Err(EngineError::InvalidName(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }

        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let source = self
                .require_piggybank(&db_tx, &cmd.user_id, cmd.source_piggybank_id)
                .await?;
            let destination = self
                .require_piggybank(&db_tx, &cmd.user_id, cmd.destination_piggybank_id)
                .await?;

            if cmd.amount_minor > source.amount_minor {
                return Err(EngineError::InsufficientFunds(format!(
                    "piggybank '{}' holds {}",
                    source.name, source.amount_minor
                )));
            }

            let outgoing = PiggybankTransaction::new(
                cmd.user_id.clone(),
                cmd.source_piggybank_id,
                None,
                cmd.amount_minor,
                transfer_description("to", &destination.name, note.as_deref()),
                PiggybankTransactionKind::Transfer,
                now,
            )?;
            let incoming = PiggybankTransaction::new(
                cmd.user_id.clone(),
                cmd.destination_piggybank_id,
                Some(cmd.source_piggybank_id),
                cmd.amount_minor,
                transfer_description("from", &source.name, note.as_deref()),
                PiggybankTransactionKind::Transfer,
                now,
            )?;

            let source = self.append_log_entry(&db_tx, &source, &outgoing).await?;
            let destination = self
                .append_log_entry(&db_tx, &destination, &incoming)
                .await?;

            tracing::info!(
                user_id = %cmd.user_id,
                source = %cmd.source_piggybank_id,
                destination = %cmd.destination_piggybank_id,
                amount_minor = cmd.amount_minor,
                "piggybank transfer"
            );
            Ok(TransferReceipt {
                outgoing,
                incoming,
                source_name: source.name,
                destination_name: destination.name,
                source_amount_minor: source.amount_minor,
                destination_amount_minor: destination.amount_minor,
            })
        })
    }
}
