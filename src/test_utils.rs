//! Shared test utilities for `FinanceBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.
#![allow(clippy::unwrap_used)]

use crate::{
    app::prompt::Prompt,
    core::{goal, recurring, transaction},
    entities::{self, TransactionKind, goal::GoalColor},
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date; panics on an invalid one.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Inserts a user row directly, bypassing password hashing.
///
/// # Defaults
/// * `password_hash`: `"not-a-real-hash"`
/// * `full_name`: `"Test User"`
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<entities::user::Model> {
    entities::user::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        full_name: Set("Test User".to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sets up a complete test environment with one user.
/// Returns (db, user) for common test scenarios.
pub async fn setup_with_user() -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "test@example.com").await?;
    Ok((db, user))
}

/// Inserts a category with no owner, visible to every user.
pub async fn insert_shared_category(
    db: &DatabaseConnection,
    name: &str,
    kind: TransactionKind,
) -> Result<entities::category::Model> {
    entities::category::ActiveModel {
        user_id: Set(None),
        name: Set(name.to_string()),
        kind: Set(kind),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Builds an unsaved transaction for pure aggregation tests.
#[must_use]
pub fn sample_transaction(
    id: i64,
    kind: TransactionKind,
    cents: i64,
    date: NaiveDate,
) -> entities::transaction::Model {
    entities::transaction::Model {
        id,
        user_id: 1,
        amount_cents: cents,
        kind,
        category_id: None,
        description: None,
        date,
        created_at: DateTime::<Utc>::default(),
    }
}

/// Records a transaction through the core API.
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    kind: TransactionKind,
    cents: i64,
    category_id: Option<i64>,
    date: NaiveDate,
) -> Result<entities::transaction::Model> {
    transaction::create_transaction(
        db,
        user_id,
        transaction::TransactionDraft {
            kind,
            amount: Decimal::new(cents, 2),
            category_id,
            description: None,
            date,
        },
    )
    .await
}

/// Builds an unsaved goal with the default colour and no deadline.
#[must_use]
pub fn sample_goal(target_cents: i64, current_cents: i64) -> entities::goal::Model {
    entities::goal::Model {
        id: 1,
        user_id: 1,
        title: "Reserva".to_string(),
        target_cents,
        current_cents,
        deadline: None,
        color: GoalColor::default(),
        created_at: DateTime::<Utc>::default(),
    }
}

/// Creates a goal through the core API.
pub async fn create_test_goal(
    db: &DatabaseConnection,
    user_id: i64,
    title: &str,
    target_cents: i64,
    current_cents: i64,
) -> Result<entities::goal::Model> {
    goal::create_goal(
        db,
        user_id,
        goal::GoalDraft {
            title: title.to_string(),
            target_amount: Decimal::new(target_cents, 2),
            current_amount: Decimal::new(current_cents, 2),
            deadline: None,
            color: GoalColor::default(),
        },
    )
    .await
}

/// Builds an unsaved, active recurring expense of 10,00.
#[must_use]
pub fn sample_recurring(id: i64, title: &str, day_of_month: i32) -> entities::recurring_expense::Model {
    entities::recurring_expense::Model {
        id,
        user_id: 1,
        title: title.to_string(),
        amount_cents: 1_000,
        category_id: None,
        day_of_month,
        active: true,
        created_at: DateTime::<Utc>::default(),
    }
}

/// Creates an uncategorized recurring expense through the core API.
pub async fn create_test_recurring(
    db: &DatabaseConnection,
    user_id: i64,
    title: &str,
    amount_cents: i64,
    day_of_month: i32,
) -> Result<entities::recurring_expense::Model> {
    recurring::create_recurring(
        db,
        user_id,
        recurring::RecurringDraft {
            title: title.to_string(),
            amount: Decimal::new(amount_cents, 2),
            category_id: None,
            day_of_month,
        },
    )
    .await
}

/// Prompt that answers confirmations with a fixed value and records everything.
#[derive(Debug, Default)]
pub struct RecordingPrompt {
    answer: bool,
    confirmations: Mutex<Vec<String>>,
    alerts: Mutex<Vec<String>>,
}

impl RecordingPrompt {
    /// Creates a prompt answering every confirmation with `answer`.
    #[must_use]
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    /// Confirmation messages asked so far.
    #[must_use]
    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Alert messages shown so far.
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl Prompt for RecordingPrompt {
    fn confirm(&self, message: &str) -> bool {
        if let Ok(mut asked) = self.confirmations.lock() {
            asked.push(message.to_string());
        }
        self.answer
    }

    fn alert(&self, message: &str) {
        if let Ok(mut shown) = self.alerts.lock() {
            shown.push(message.to_string());
        }
    }
}
