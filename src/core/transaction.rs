//! Transaction business logic - Handles recording, listing and deleting transactions.
//!
//! Every query is scoped to the calling user: a transaction owned by someone else
//! behaves exactly like one that does not exist. Transactions are never updated;
//! corrections are made by deleting and recording again.

use crate::{
    core::{category::get_visible_category, money},
    entities::{Category, Transaction, TransactionKind, category, transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info};

/// A transaction paired with its category, as listed in history views.
pub type TransactionWithCategory = (transaction::Model, Option<category::Model>);

/// Validated input for a new transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    /// Income or expense
    pub kind: TransactionKind,
    /// Non-negative amount with at most two fraction digits
    pub amount: Decimal,
    /// Chosen category
    pub category_id: Option<i64>,
    /// Trimmed description, None when blank
    pub description: Option<String>,
    /// Date the transaction applies to
    pub date: NaiveDate,
}

/// Raw values from the "new transaction" form.
#[derive(Debug, Clone)]
pub struct TransactionForm {
    /// Selected type
    pub kind: TransactionKind,
    /// Amount typed as minor-unit digits ("2500" = 25,00)
    pub amount: String,
    /// Selected category
    pub category_id: Option<i64>,
    /// Description text
    pub description: String,
    /// Date as `YYYY-MM-DD`
    pub date: String,
}

impl TransactionForm {
    /// Empty form for the given type, dated `today`.
    #[must_use]
    pub fn new(kind: TransactionKind, today: NaiveDate) -> Self {
        Self {
            kind,
            amount: String::new(),
            category_id: None,
            description: String::new(),
            date: today.format("%Y-%m-%d").to_string(),
        }
    }

    /// Validates the form and produces a draft.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] for a zero amount, a missing category or an
    /// unparsable date, and [`Error::InvalidAmountInput`] for an oversized amount.
    pub fn validate(&self) -> Result<TransactionDraft> {
        let amount = money::parse_minor_units(&self.amount)?;
        if amount.is_zero() {
            return Err(Error::Validation {
                field: "amount",
                reason: "enter an amount".to_string(),
            });
        }

        let Some(category_id) = self.category_id else {
            return Err(Error::Validation {
                field: "category_id",
                reason: "select a category".to_string(),
            });
        };

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|e| {
            Error::Validation {
                field: "date",
                reason: e.to_string(),
            }
        })?;

        Ok(TransactionDraft {
            kind: self.kind,
            amount,
            category_id: Some(category_id),
            description: normalize_description(&self.description),
            date,
        })
    }
}

fn normalize_description(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Records a new transaction for the user.
///
/// The category, when given, must be visible to the user and of the same type.
///
/// # Errors
/// Returns an error if the amount is invalid, the category is unknown or of
/// the wrong type, or the backend fails.
pub async fn create_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    draft: TransactionDraft,
) -> Result<transaction::Model> {
    let amount_cents = money::to_cents(draft.amount)?;

    if let Some(category_id) = draft.category_id {
        let category = get_visible_category(db, user_id, category_id)
            .await?
            .ok_or(Error::NotFound {
                entity: "category",
                id: category_id,
            })?;
        if category.kind != draft.kind {
            return Err(Error::Validation {
                field: "category_id",
                reason: format!(
                    "category '{}' is for {}, not {}",
                    category.name, category.kind, draft.kind
                ),
            });
        }
    }

    let created = transaction::ActiveModel {
        user_id: Set(user_id),
        amount_cents: Set(amount_cents),
        kind: Set(draft.kind),
        category_id: Set(draft.category_id),
        description: Set(draft.description),
        date: Set(draft.date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Recorded {} of {} for user {user_id} on {}",
        created.kind,
        created.amount(),
        created.date
    );
    Ok(created)
}

/// Retrieves all of the user's transactions, newest first.
///
/// Ordering is `date` desc, then `created_at` desc.
pub async fn get_transactions_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<transaction::Model>> {
    debug!("Fetching transactions for user {user_id}");
    Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the user's transactions with their categories, newest first.
pub async fn list_transactions(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<TransactionWithCategory>> {
    Transaction::find()
        .find_also_related(Category)
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one of the user's transactions by id.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .filter(transaction::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Deletes one of the user's transactions.
///
/// # Errors
/// Returns [`Error::NotFound`] if the id does not exist or belongs to another user.
pub async fn delete_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
) -> Result<()> {
    let result = Transaction::delete_many()
        .filter(transaction::Column::Id.eq(transaction_id))
        .filter(transaction::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "transaction",
            id: transaction_id,
        });
    }

    info!("Deleted transaction {transaction_id} for user {user_id}");
    Ok(())
}

/// Formats a date the way history tables show it: `dd/mm/yyyy`.
#[must_use]
pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Description shown in the history table.
#[must_use]
pub fn display_description(tx: &transaction::Model) -> &str {
    tx.description.as_deref().unwrap_or("Sem descrição")
}

/// Category label shown in the history table.
#[must_use]
pub fn display_category(category: Option<&category::Model>) -> &str {
    category.map_or("Geral", |c| c.name.as_str())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::category::ensure_category;
    use crate::test_utils::*;

    #[test]
    fn test_form_validation() {
        let today = date(2024, 5, 10);
        let mut form = TransactionForm::new(TransactionKind::Expense, today);
        assert_eq!(form.date, "2024-05-10");

        // Nothing typed yet
        assert!(matches!(
            form.validate(),
            Err(Error::Validation { field: "amount", .. })
        ));

        form.amount = "2500".to_string();
        assert!(matches!(
            form.validate(),
            Err(Error::Validation { field: "category_id", .. })
        ));

        form.category_id = Some(3);
        form.description = "  Mercado  ".to_string();
        let draft = form.validate().unwrap();
        assert_eq!(draft.amount, Decimal::new(2500, 2));
        assert_eq!(draft.description.as_deref(), Some("Mercado"));
        assert_eq!(draft.date, today);

        form.description = "   ".to_string();
        assert!(form.validate().unwrap().description.is_none());

        form.date = "10/05/2024".to_string();
        assert!(matches!(
            form.validate(),
            Err(Error::Validation { field: "date", .. })
        ));
    }

    #[tokio::test]
    async fn test_create_transaction_rejects_bad_amount() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let draft = TransactionDraft {
            kind: TransactionKind::Expense,
            amount: Decimal::new(1, 3),
            category_id: None,
            description: None,
            date: date(2024, 1, 1),
        };

        let result = create_transaction(&db, user.id, draft).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        assert!(get_transactions_for_user(&db, user.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_category_not_found() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let draft = TransactionDraft {
            kind: TransactionKind::Expense,
            amount: Decimal::new(1000, 2),
            category_id: Some(42),
            description: None,
            date: date(2024, 1, 1),
        };

        let result = create_transaction(&db, user.id, draft).await;
        assert!(matches!(
            result,
            Err(Error::NotFound { entity: "category", id: 42 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_integration() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let food = ensure_category(&db, user.id, "Alimentação", TransactionKind::Expense).await?;

        let tx = create_test_transaction(&db, user.id, TransactionKind::Expense, 2500, Some(food.id), date(2024, 5, 1)).await?;
        assert_eq!(tx.user_id, user.id);
        assert_eq!(tx.amount(), Decimal::new(2500, 2));
        assert_eq!(tx.amount().to_string(), "25.00");
        assert_eq!(tx.category_id, Some(food.id));

        let found = get_transaction_by_id(&db, user.id, tx.id).await?;
        assert_eq!(found, Some(tx));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_category_kind_mismatch() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let salary = ensure_category(&db, user.id, "Salário", TransactionKind::Income).await?;

        let result = create_test_transaction(&db, user.id, TransactionKind::Expense, 100, Some(salary.id), date(2024, 5, 1)).await;
        assert!(matches!(
            result,
            Err(Error::Validation { field: "category_id", .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_transactions_newest_first_with_category() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let food = ensure_category(&db, user.id, "Alimentação", TransactionKind::Expense).await?;

        let older = create_test_transaction(&db, user.id, TransactionKind::Expense, 100, Some(food.id), date(2024, 5, 1)).await?;
        let newer = create_test_transaction(&db, user.id, TransactionKind::Income, 900, None, date(2024, 5, 3)).await?;
        let same_day_later = create_test_transaction(&db, user.id, TransactionKind::Expense, 50, None, date(2024, 5, 3)).await?;

        let rows = list_transactions(&db, user.id).await?;
        let ids: Vec<_> = rows.iter().map(|(tx, _)| tx.id).collect();
        assert_eq!(ids, vec![same_day_later.id, newer.id, older.id]);
        assert_eq!(rows[2].1.as_ref().map(|c| c.name.as_str()), Some("Alimentação"));
        assert!(rows[0].1.is_none());
        assert_eq!(display_category(rows[0].1.as_ref()), "Geral");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_then_refetch_excludes_deleted() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let keep = create_test_transaction(&db, user.id, TransactionKind::Income, 100, None, date(2024, 5, 1)).await?;
        let gone = create_test_transaction(&db, user.id, TransactionKind::Expense, 200, None, date(2024, 5, 2)).await?;

        delete_transaction(&db, user.id, gone.id).await?;

        let remaining = get_transactions_for_user(&db, user.id).await?;
        assert_eq!(remaining, vec![keep]);
        assert!(remaining.iter().all(|tx| tx.id != gone.id));

        // Deleting again reports the missing row
        let again = delete_transaction(&db, user.id, gone.id).await;
        assert!(matches!(again, Err(Error::NotFound { entity: "transaction", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_transactions_are_scoped_to_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;
        let tx = create_test_transaction(&db, alice.id, TransactionKind::Income, 100, None, date(2024, 5, 1)).await?;

        assert!(get_transactions_for_user(&db, bob.id).await?.is_empty());
        assert!(get_transaction_by_id(&db, bob.id, tx.id).await?.is_none());
        assert!(matches!(
            delete_transaction(&db, bob.id, tx.id).await,
            Err(Error::NotFound { .. })
        ));
        assert_eq!(get_transactions_for_user(&db, alice.id).await?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_display_helpers() {
        let mut tx = sample_transaction(1, TransactionKind::Expense, 100, date(2024, 1, 9));
        assert_eq!(format_date_br(tx.date), "09/01/2024");
        assert_eq!(display_description(&tx), "Sem descrição");
        tx.description = Some("Padaria".to_string());
        assert_eq!(display_description(&tx), "Padaria");
    }
}
