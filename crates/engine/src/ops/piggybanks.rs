use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, NewPiggybankCmd, Piggybank, PiggybankTransactionKind, ResultEngine,
    UpdatePiggybankCmd, piggybank_transactions, piggybank_transactions::PiggybankTransaction,
    piggybanks,
    util::{
        normalize_optional_description, normalize_required_name, parse_uuid,
        require_non_negative_amount,
    },
};

use super::{Engine, with_tx};

const INITIAL_DEPOSIT_DESCRIPTION: &str = "initial deposit";

/// Totals over every piggybank of a user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PiggybankSummary {
    pub total_amount_minor: i64,
    pub count: usize,
    /// Balance of the main piggybank, `0` when the user has none.
    pub main_amount_minor: i64,
    pub piggybanks: Vec<Piggybank>,
}

/// Outcome of a deletion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletedPiggybank {
    pub piggybank_id: Uuid,
    /// Balance moved to the main piggybank (`0` when nothing was moved).
    pub migrated_minor: i64,
    /// The main piggybank that received the balance.
    pub main_piggybank_id: Option<Uuid>,
}

impl Engine {
    /// All piggybanks of the user: main first, then newest first.
    pub async fn list_piggybanks(&self, user_id: &str) -> ResultEngine<Vec<Piggybank>> {
        with_tx!(self, |db_tx| {
            let models = piggybanks::Entity::find()
                .filter(piggybanks::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(piggybanks::Column::IsMainPiggybank)
                .order_by_desc(piggybanks::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Piggybank::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Return a piggybank snapshot from DB.
    pub async fn piggybank(&self, user_id: &str, piggybank_id: Uuid) -> ResultEngine<Piggybank> {
        with_tx!(self, |db_tx| {
            let model = self.require_piggybank(&db_tx, user_id, piggybank_id).await?;
            Piggybank::try_from(model)
        })
    }

    pub async fn piggybank_summary(&self, user_id: &str) -> ResultEngine<PiggybankSummary> {
        let piggybanks = self.list_piggybanks(user_id).await?;
        let total_amount_minor = piggybanks.iter().map(|p| p.amount_minor).sum();
        let main_amount_minor = piggybanks
            .iter()
            .find(|p| p.is_main)
            .map_or(0, |p| p.amount_minor);
        Ok(PiggybankSummary {
            total_amount_minor,
            count: piggybanks.len(),
            main_amount_minor,
            piggybanks,
        })
    }

    /// Create a piggybank.
    ///
    /// The user's first piggybank becomes the main one. The check runs in the
    /// same DB transaction as the insert. A positive opening balance is logged
    /// as an "initial deposit".
    pub async fn new_piggybank(&self, cmd: NewPiggybankCmd) -> ResultEngine<Piggybank> {
        let NewPiggybankCmd {
            user_id,
            name,
            description,
            target_amount_minor,
            initial_amount_minor,
        } = cmd;
        let name = normalize_required_name(&name, "piggybank")?;
        let description = normalize_optional_description(description.as_deref())?;
        require_non_negative_amount(target_amount_minor, "target amount")?;
        require_non_negative_amount(initial_amount_minor, "initial amount")?;

        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let is_main = self.count_piggybanks(&db_tx, &user_id).await? == 0;
            let piggybank = Piggybank::new(
                user_id.clone(),
                name,
                description,
                target_amount_minor,
                is_main,
                now,
            );
            let mut model = piggybanks::ActiveModel::from(&piggybank)
                .insert(&db_tx)
                .await?;

            if initial_amount_minor > 0 {
                let entry = PiggybankTransaction::new(
                    user_id.clone(),
                    piggybank.id,
                    None,
                    initial_amount_minor,
                    INITIAL_DEPOSIT_DESCRIPTION.to_string(),
                    PiggybankTransactionKind::Deposit,
                    now,
                )?;
                model = self.append_log_entry(&db_tx, &model, &entry).await?;
            }

            tracing::info!(
                user_id = %user_id,
                piggybank_id = %piggybank.id,
                is_main,
                "piggybank created"
            );
            Piggybank::try_from(model)
        })
    }

    /// Edit name, description and target of a piggybank.
    pub async fn update_piggybank(&self, cmd: UpdatePiggybankCmd) -> ResultEngine<Piggybank> {
        let name = normalize_required_name(&cmd.name, "piggybank")?;
        let description = normalize_optional_description(cmd.description.as_deref())?;
        require_non_negative_amount(cmd.target_amount_minor, "target amount")?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_piggybank(&db_tx, &cmd.user_id, cmd.piggybank_id)
                .await?;
            let active = piggybanks::ActiveModel {
                id: ActiveValue::Set(model.id),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(description),
                target_amount_minor: ActiveValue::Set(cmd.target_amount_minor),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            Piggybank::try_from(model)
        })
    }

    /// Delete a piggybank and move its balance to the main piggybank.
    ///
    /// The main piggybank can only be deleted once it is the last one. The
    /// log entries of the deleted piggybank, and every transfer entry naming
    /// it as source, are purged before the balance migration is logged on the
    /// main piggybank, so the migration entry survives. A main piggybank is
    /// created when a positive balance has nowhere to go.
    pub async fn delete_piggybank(
        &self,
        user_id: &str,
        piggybank_id: Uuid,
    ) -> ResultEngine<DeletedPiggybank> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let target = self.require_piggybank(&db_tx, user_id, piggybank_id).await?;

            if target.is_main_piggybank {
                let siblings = piggybanks::Entity::find()
                    .filter(piggybanks::Column::UserId.eq(user_id.to_string()))
                    .filter(piggybanks::Column::Id.ne(target.id.clone()))
                    .count(&db_tx)
                    .await?;
                if siblings > 0 {
                    return Err(EngineError::Conflict(
                        "main piggybank cannot be deleted while other piggybanks exist"
                            .to_string(),
                    ));
                }
            }

            let purged = piggybank_transactions::Entity::delete_many()
                .filter(
                    Condition::any()
                        .add(piggybank_transactions::Column::PiggybankId.eq(target.id.clone()))
                        .add(
                            piggybank_transactions::Column::SourcePiggybankId
                                .eq(target.id.clone()),
                        ),
                )
                .exec(&db_tx)
                .await?;

            piggybanks::Entity::delete_by_id(target.id.clone())
                .exec(&db_tx)
                .await?;

            let mut deleted = DeletedPiggybank {
                piggybank_id,
                migrated_minor: 0,
                main_piggybank_id: None,
            };

            if !target.is_main_piggybank && target.amount_minor > 0 {
                let main = self.ensure_main_piggybank(&db_tx, user_id, now).await?;
                let entry = PiggybankTransaction::new(
                    user_id.to_string(),
                    parse_uuid(&main.id, "piggybank")?,
                    Some(piggybank_id),
                    target.amount_minor,
                    format!(
                        "automatic transfer on deletion of piggybank '{}'",
                        target.name
                    ),
                    PiggybankTransactionKind::Transfer,
                    now,
                )?;
                self.append_log_entry(&db_tx, &main, &entry).await?;
                deleted.migrated_minor = target.amount_minor;
                deleted.main_piggybank_id = Some(entry.piggybank_id);
            }

            tracing::info!(
                user_id,
                piggybank_id = %piggybank_id,
                purged_entries = purged.rows_affected,
                migrated_minor = deleted.migrated_minor,
                "piggybank deleted"
            );
            Ok(deleted)
        })
    }
}
