//! Category business logic - listing and provisioning of categories.
//!
//! Categories are provisioned lazily: the first time a user opens a form for a
//! type with no categories, the configured defaults are inserted for them.
//! Provisioning is an idempotent "ensure exists" upsert, bounded by a maximum
//! number of attempts so a backend that silently drops inserts cannot make the
//! client loop forever.

use crate::{
    config::app::{CategoriesConfig, CategorySeed},
    entities::{Category, TransactionKind, category},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use tracing::{debug, info, warn};

/// Rows a user may see: their own plus shared (`user_id IS NULL`) categories.
pub(crate) fn visible_to(user_id: i64) -> Condition {
    Condition::any()
        .add(category::Column::UserId.eq(user_id))
        .add(category::Column::UserId.is_null())
}

/// Lists the categories of one type visible to the user, ordered by name.
pub async fn list_categories(
    db: &DatabaseConnection,
    user_id: i64,
    kind: TransactionKind,
) -> Result<Vec<category::Model>> {
    Category::find()
        .filter(visible_to(user_id))
        .filter(category::Column::Kind.eq(kind))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by id if the user may see it.
pub async fn get_visible_category(
    db: &DatabaseConnection,
    user_id: i64,
    category_id: i64,
) -> Result<Option<category::Model>> {
    Category::find_by_id(category_id)
        .filter(visible_to(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the visible category called `name` of the given type, inserting a
/// user-owned one if it does not exist yet.
///
/// # Errors
/// Returns an error if the name is blank or the backend fails.
pub async fn ensure_category(
    db: &DatabaseConnection,
    user_id: i64,
    name: &str,
    kind: TransactionKind,
) -> Result<category::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            field: "name",
            reason: "category name cannot be empty".to_string(),
        });
    }

    let existing = Category::find()
        .filter(visible_to(user_id))
        .filter(category::Column::Kind.eq(kind))
        .filter(category::Column::Name.eq(name))
        .one(db)
        .await?;

    if let Some(found) = existing {
        return Ok(found);
    }

    let created = category::ActiveModel {
        user_id: Set(Some(user_id)),
        name: Set(name.to_string()),
        kind: Set(kind),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created {kind} category '{name}' for user {user_id}");
    Ok(created)
}

async fn provision_once(
    db: &DatabaseConnection,
    user_id: i64,
    kind: TransactionKind,
    seed: &CategorySeed,
) -> Result<Vec<category::Model>> {
    for name in &seed.required {
        ensure_category(db, user_id, name, kind).await?;
    }

    let categories = list_categories(db, user_id, kind).await?;
    if !categories.is_empty() {
        return Ok(categories);
    }

    debug!("User {user_id} has no {kind} categories, inserting defaults");
    for name in &seed.defaults {
        ensure_category(db, user_id, name, kind).await?;
    }
    list_categories(db, user_id, kind).await
}

/// Makes sure the user has categories of the given type before a form uses them.
///
/// Required names are ensured on every call; defaults are inserted only when
/// the user has none of that type. Returns the visible categories afterwards.
///
/// # Errors
/// Returns [`Error::CategorySeeding`] when no category is available after
/// `seed_max_attempts` rounds; it carries the last backend error message.
pub async fn ensure_default_categories(
    db: &DatabaseConnection,
    user_id: i64,
    kind: TransactionKind,
    config: &CategoriesConfig,
) -> Result<Vec<category::Model>> {
    let seed = config.seed_for(kind);
    let attempts = config.seed_max_attempts.max(1);

    let mut reason = String::new();
    for attempt in 1..=attempts {
        match provision_once(db, user_id, kind, seed).await {
            Ok(categories) if !categories.is_empty() => return Ok(categories),
            Ok(_) => {
                warn!("Provisioning {kind} categories for user {user_id} left none (attempt {attempt}/{attempts})");
                reason = "no category available".to_string();
            }
            Err(e) => {
                warn!("Provisioning {kind} categories for user {user_id} failed (attempt {attempt}/{attempts}): {e}");
                reason = e.to_string();
            }
        }
    }

    Err(Error::CategorySeeding {
        kind: kind.to_string(),
        attempts,
        reason,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;

    #[tokio::test]
    async fn test_seeds_defaults_when_empty() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let config = CategoriesConfig::default();

        let expense = ensure_default_categories(&db, user.id, TransactionKind::Expense, &config).await?;
        let names: Vec<_> = expense.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alimentação", "Lazer", "Moradia", "Transporte"]);
        assert!(expense.iter().all(|c| c.user_id == Some(user.id)));

        let income = ensure_default_categories(&db, user.id, TransactionKind::Income, &config).await?;
        assert_eq!(income.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let config = CategoriesConfig::default();

        ensure_default_categories(&db, user.id, TransactionKind::Expense, &config).await?;
        let second = ensure_default_categories(&db, user.id, TransactionKind::Expense, &config).await?;
        assert_eq!(second.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_categories_skip_defaults() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        ensure_category(&db, user.id, "Mercado", TransactionKind::Expense).await?;

        let config = CategoriesConfig::default();
        let categories = ensure_default_categories(&db, user.id, TransactionKind::Expense, &config).await?;
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Mercado");
        Ok(())
    }

    #[tokio::test]
    async fn test_required_names_always_ensured() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        ensure_category(&db, user.id, "Mercado", TransactionKind::Expense).await?;

        let mut config = CategoriesConfig::default();
        config.expense.required = vec!["Contas Fixas".to_string()];

        let categories = ensure_default_categories(&db, user.id, TransactionKind::Expense, &config).await?;
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Contas Fixas", "Mercado"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_seeding_gives_up_after_max_attempts() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let mut config = CategoriesConfig::default();
        config.income.defaults.clear();
        config.seed_max_attempts = 2;

        let result = ensure_default_categories(&db, user.id, TransactionKind::Income, &config).await;
        assert!(matches!(
            result,
            Err(Error::CategorySeeding { attempts: 2, ref reason, .. }) if reason == "no category available"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_seeding_failure_keeps_backend_message() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        db.execute_unprepared("DROP TABLE categories").await?;

        let err = ensure_default_categories(&db, user.id, TransactionKind::Expense, &CategoriesConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CategorySeeding { attempts: 3, .. }));
        assert!(err.to_string().contains("no such table: categories"), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn test_shared_categories_are_visible() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let shared = insert_shared_category(&db, "Impostos", TransactionKind::Expense).await?;

        let categories = list_categories(&db, user.id, TransactionKind::Expense).await?;
        assert_eq!(categories, vec![shared.clone()]);

        // Ensuring the same name reuses the shared row instead of duplicating it
        let ensured = ensure_category(&db, user.id, "Impostos", TransactionKind::Expense).await?;
        assert_eq!(ensured.id, shared.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_other_users_categories_are_hidden() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;
        let private = ensure_category(&db, alice.id, "Viagem", TransactionKind::Expense).await?;

        assert!(list_categories(&db, bob.id, TransactionKind::Expense).await?.is_empty());
        assert!(get_visible_category(&db, bob.id, private.id).await?.is_none());
        assert!(get_visible_category(&db, alice.id, private.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_category_rejects_blank_name() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let result = ensure_category(&db, user.id, "   ", TransactionKind::Expense).await;
        assert!(matches!(result, Err(Error::Validation { field: "name", .. })));
        Ok(())
    }
}
