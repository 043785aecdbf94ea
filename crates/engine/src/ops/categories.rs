use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Category, EngineError, NewCategoryCmd, ResultEngine, UpdateCategoryCmd, budgets,
    categories::{self, DEFAULT_COLOR, DEFAULT_ICON},
    transactions,
    util::{
        name_key, normalize_color, normalize_optional_description, normalize_optional_text,
        normalize_required_name,
    },
};

use super::{Engine, with_tx};

/// Validated editable fields shared by create and update.
struct CategoryFields {
    name: String,
    description: Option<String>,
    color: String,
    icon: String,
}

fn category_fields(
    name: &str,
    description: Option<&str>,
    color: Option<&str>,
    icon: Option<&str>,
) -> ResultEngine<CategoryFields> {
    let color = match normalize_optional_text(color) {
        Some(color) => normalize_color(&color)?,
        None => DEFAULT_COLOR.to_string(),
    };
    Ok(CategoryFields {
        name: normalize_required_name(name, "category")?,
        description: normalize_optional_description(description)?,
        color,
        icon: normalize_optional_text(icon).unwrap_or_else(|| DEFAULT_ICON.to_string()),
    })
}

impl Engine {
    /// Create a category owned by the user.
    ///
    /// Names are unique per user, compared case-insensitively and against the
    /// shared defaults too.
    pub async fn new_category(&self, cmd: NewCategoryCmd) -> ResultEngine<Category> {
        let fields = category_fields(
            &cmd.name,
            cmd.description.as_deref(),
            cmd.color.as_deref(),
            cmd.icon.as_deref(),
        )?;

        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.reject_taken_name(&db_tx, &cmd.user_id, &fields.name, None)
                .await?;

            let category = Category {
                id: Uuid::new_v4(),
                user_id: Some(cmd.user_id.clone()),
                name: fields.name,
                description: fields.description,
                color: fields.color,
                icon: fields.icon,
                is_default: false,
                created_at: now,
                updated_at: now,
            };
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;
            Ok(category)
        })
    }

    /// The user's categories and the shared defaults, by name.
    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            self.visible_categories(&db_tx, user_id)
                .await?
                .into_iter()
                .map(Category::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// The shared defaults only, by name. Needs no user.
    pub async fn default_categories(&self) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            categories::Entity::find()
                .filter(categories::Column::UserId.is_null())
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Category::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_category_visible(&db_tx, user_id, category_id)
                .await?;
            Category::try_from(model)
        })
    }

    /// Replace the editable fields of one of the user's categories.
    ///
    /// Shared defaults are read-only (`Conflict`).
    pub async fn update_category(&self, cmd: UpdateCategoryCmd) -> ResultEngine<Category> {
        let fields = category_fields(
            &cmd.name,
            cmd.description.as_deref(),
            cmd.color.as_deref(),
            cmd.icon.as_deref(),
        )?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_own_category(&db_tx, &cmd.user_id, cmd.category_id, "changed")
                .await?;
            self.reject_taken_name(&db_tx, &cmd.user_id, &fields.name, Some(&model.id))
                .await?;

            let active = categories::ActiveModel {
                id: ActiveValue::Set(model.id),
                name: ActiveValue::Set(fields.name),
                description: ActiveValue::Set(fields.description),
                color: ActiveValue::Set(fields.color),
                icon: ActiveValue::Set(fields.icon),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            Category::try_from(model)
        })
    }

    /// Delete one of the user's categories.
    ///
    /// Refused with `Conflict` for shared defaults and while transactions or
    /// budgets still reference the category.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_own_category(&db_tx, user_id, category_id, "deleted")
                .await?;

            let in_use = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            if in_use > 0 {
                return Err(EngineError::Conflict(format!(
                    "category '{}' is used by {in_use} transactions",
                    model.name
                )));
            }
            let budgeted = budgets::Entity::find()
                .filter(budgets::Column::CategoryId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            if budgeted > 0 {
                return Err(EngineError::Conflict(format!(
                    "category '{}' is used by {budgeted} budgets",
                    model.name
                )));
            }

            categories::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            tracing::info!(user_id, category_id = %category_id, "category deleted");
            Ok(())
        })
    }

    pub(super) async fn visible_categories(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Vec<categories::Model>> {
        categories::Entity::find()
            .filter(
                Condition::any()
                    .add(categories::Column::UserId.eq(user_id.to_string()))
                    .add(categories::Column::UserId.is_null()),
            )
            .order_by_asc(categories::Column::Name)
            .all(db)
            .await
            .map_err(Into::into)
    }

    async fn require_own_category(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        category_id: Uuid,
        action: &str,
    ) -> ResultEngine<categories::Model> {
        let model = self
            .require_category_visible(db, user_id, category_id)
            .await?;
        if model.user_id.is_none() {
            return Err(EngineError::Conflict(format!(
                "default category '{}' cannot be {action}",
                model.name
            )));
        }
        Ok(model)
    }

    async fn reject_taken_name(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        name: &str,
        exclude_id: Option<&str>,
    ) -> ResultEngine<()> {
        let key = name_key(name);
        let taken = self
            .visible_categories(db, user_id)
            .await?
            .iter()
            .filter(|model| Some(model.id.as_str()) != exclude_id)
            .any(|model| name_key(&model.name) == key);
        if taken {
            return Err(EngineError::Conflict(format!(
                "category '{name}' already exists"
            )));
        }
        Ok(())
    }
}
