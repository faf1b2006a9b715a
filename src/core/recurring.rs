//! Recurring expense logic - monthly bills, launching them and due-date notifications.

use crate::{
    core::{category::get_visible_category, money, transaction::{self, TransactionDraft}},
    entities::{Category, RecurringExpense, TransactionKind, category, recurring_expense},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{debug, info};

/// Look-ahead, in days, of the due-soon window.
pub const DEFAULT_DUE_SOON_DAYS: u32 = 3;

/// Day pre-selected in a fresh form.
pub const DEFAULT_FORM_DAY: i32 = 5;

/// Prefix of the description of a launched bill.
pub const LAUNCH_DESCRIPTION_PREFIX: &str = "[Conta Fixa]";

/// A recurring expense paired with its category.
pub type RecurringWithCategory = (recurring_expense::Model, Option<category::Model>);

/// Validated recurring expense input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringDraft {
    /// Trimmed title
    pub title: String,
    /// Bill amount
    pub amount: Decimal,
    /// Expense category used on launch
    pub category_id: Option<i64>,
    /// Due day, 1..=31
    pub day_of_month: i32,
}

/// Raw values from the recurring expense form.
#[derive(Debug, Clone)]
pub struct RecurringForm {
    /// Title text
    pub title: String,
    /// Amount typed as minor units
    pub amount: String,
    /// Selected category
    pub category_id: Option<i64>,
    /// Due day as typed
    pub day_of_month: String,
}

impl Default for RecurringForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            amount: String::new(),
            category_id: None,
            day_of_month: DEFAULT_FORM_DAY.to_string(),
        }
    }
}

impl RecurringForm {
    /// Pre-fills the form from a stored bill for editing.
    #[must_use]
    pub fn from_recurring(item: &recurring_expense::Model) -> Self {
        Self {
            title: item.title.clone(),
            amount: item.amount_cents.to_string(),
            category_id: item.category_id,
            day_of_month: item.day_of_month.to_string(),
        }
    }

    /// Validates the form and produces a draft.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] for a blank title, a zero amount or a day
    /// outside `1..=31`.
    pub fn validate(&self) -> Result<RecurringDraft> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::Validation {
                field: "title",
                reason: "title cannot be empty".to_string(),
            });
        }

        let amount = money::parse_minor_units(&self.amount)?;
        if amount.is_zero() {
            return Err(Error::Validation {
                field: "amount",
                reason: "enter an amount".to_string(),
            });
        }

        let day_of_month = self
            .day_of_month
            .trim()
            .parse::<i32>()
            .map_err(|e| Error::Validation {
                field: "day_of_month",
                reason: e.to_string(),
            })?;
        validate_day(day_of_month)?;

        Ok(RecurringDraft {
            title: title.to_string(),
            amount,
            category_id: self.category_id,
            day_of_month,
        })
    }
}

fn validate_day(day: i32) -> Result<()> {
    if (1..=31).contains(&day) {
        Ok(())
    } else {
        Err(Error::Validation {
            field: "day_of_month",
            reason: format!("day must be between 1 and 31, got {day}"),
        })
    }
}

async fn check_category(db: &DatabaseConnection, user_id: i64, category_id: Option<i64>) -> Result<()> {
    let Some(id) = category_id else {
        return Ok(());
    };
    let category = get_visible_category(db, user_id, id)
        .await?
        .ok_or(Error::NotFound { entity: "category", id })?;
    if category.kind != TransactionKind::Expense {
        return Err(Error::Validation {
            field: "category_id",
            reason: format!("category '{}' is not an expense category", category.name),
        });
    }
    Ok(())
}

/// Creates an active recurring expense for the user.
pub async fn create_recurring(
    db: &DatabaseConnection,
    user_id: i64,
    draft: RecurringDraft,
) -> Result<recurring_expense::Model> {
    validate_day(draft.day_of_month)?;
    let amount_cents = money::to_cents(draft.amount)?;
    check_category(db, user_id, draft.category_id).await?;

    let created = recurring_expense::ActiveModel {
        user_id: Set(user_id),
        title: Set(draft.title),
        amount_cents: Set(amount_cents),
        category_id: Set(draft.category_id),
        day_of_month: Set(draft.day_of_month),
        active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Created recurring expense '{}' (day {}) for user {user_id}",
        created.title, created.day_of_month
    );
    Ok(created)
}

/// Replaces the editable fields of one of the user's bills.
///
/// Saving the form always leaves the bill active.
///
/// # Errors
/// Returns [`Error::NotFound`] if the bill does not exist or belongs to another user.
pub async fn update_recurring(
    db: &DatabaseConnection,
    user_id: i64,
    recurring_id: i64,
    draft: RecurringDraft,
) -> Result<recurring_expense::Model> {
    validate_day(draft.day_of_month)?;
    let amount_cents = money::to_cents(draft.amount)?;
    let existing = find_owned(db, user_id, recurring_id).await?;
    check_category(db, user_id, draft.category_id).await?;

    let mut active: recurring_expense::ActiveModel = existing.into();
    active.title = Set(draft.title);
    active.amount_cents = Set(amount_cents);
    active.category_id = Set(draft.category_id);
    active.day_of_month = Set(draft.day_of_month);
    active.active = Set(true);
    let updated = active.update(db).await?;

    info!("Updated recurring expense {recurring_id} for user {user_id}");
    Ok(updated)
}

/// Turns notifications for a bill on or off.
pub async fn set_recurring_active(
    db: &DatabaseConnection,
    user_id: i64,
    recurring_id: i64,
    is_active: bool,
) -> Result<recurring_expense::Model> {
    let existing = find_owned(db, user_id, recurring_id).await?;
    let mut active: recurring_expense::ActiveModel = existing.into();
    active.active = Set(is_active);
    let updated = active.update(db).await?;

    info!("Recurring expense {recurring_id} active = {is_active}");
    Ok(updated)
}

async fn find_owned(
    db: &DatabaseConnection,
    user_id: i64,
    recurring_id: i64,
) -> Result<recurring_expense::Model> {
    get_recurring_by_id(db, user_id, recurring_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "recurring expense",
            id: recurring_id,
        })
}

/// Retrieves one of the user's bills.
pub async fn get_recurring_by_id(
    db: &DatabaseConnection,
    user_id: i64,
    recurring_id: i64,
) -> Result<Option<recurring_expense::Model>> {
    RecurringExpense::find_by_id(recurring_id)
        .filter(recurring_expense::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the user's bills with their categories, by due day.
pub async fn list_recurring(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<RecurringWithCategory>> {
    debug!("Fetching recurring expenses for user {user_id}");
    RecurringExpense::find()
        .find_also_related(Category)
        .filter(recurring_expense::Column::UserId.eq(user_id))
        .order_by_asc(recurring_expense::Column::DayOfMonth)
        .order_by_asc(recurring_expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes one of the user's bills. Transactions already launched from it are kept.
///
/// # Errors
/// Returns [`Error::NotFound`] if the bill does not exist or belongs to another user.
pub async fn delete_recurring(db: &DatabaseConnection, user_id: i64, recurring_id: i64) -> Result<()> {
    let result = RecurringExpense::delete_many()
        .filter(recurring_expense::Column::Id.eq(recurring_id))
        .filter(recurring_expense::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "recurring expense",
            id: recurring_id,
        });
    }
    info!("Deleted recurring expense {recurring_id} for user {user_id}");
    Ok(())
}

/// Description given to the transaction a launch records.
#[must_use]
pub fn launch_description(item: &recurring_expense::Model) -> String {
    format!("{LAUNCH_DESCRIPTION_PREFIX} {}", item.title)
}

/// Records the bill as an expense dated `today`, with the same amount and category.
///
/// Launching twice records two transactions.
pub async fn launch_recurring(
    db: &DatabaseConnection,
    user_id: i64,
    recurring_id: i64,
    today: NaiveDate,
) -> Result<crate::entities::TransactionModel> {
    let item = find_owned(db, user_id, recurring_id).await?;
    let draft = TransactionDraft {
        kind: TransactionKind::Expense,
        amount: item.amount(),
        category_id: item.category_id,
        description: Some(launch_description(&item)),
        date: today,
    };
    let created = transaction::create_transaction(db, user_id, draft).await?;
    info!("Launched recurring expense {recurring_id} as transaction {}", created.id);
    Ok(created)
}

/// How pressing a due bill is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Due today
    Urgent,
    /// Due within the look-ahead window
    Warning,
}

/// An in-app reminder for a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Id of the recurring expense
    pub id: i64,
    /// Bill title
    pub title: String,
    /// Text shown to the user
    pub message: String,
    /// Urgency
    pub severity: Severity,
}

/// Computes notifications for the bills due today or within `window_days`.
///
/// Rules, first match wins: due day equal to today's day is urgent; a due day
/// in `(today, today + window_days]` is a warning; anything else is silent.
/// Inactive bills are skipped and output keeps input order.
///
/// The window does not wrap into the next month: on the 30th a bill due on
/// the 2nd produces nothing.
#[must_use]
pub fn evaluate_due(
    items: &[recurring_expense::Model],
    today: NaiveDate,
    window_days: u32,
) -> Vec<Notification> {
    let today_day = i64::from(today.day());
    let horizon = today_day + i64::from(window_days);

    items
        .iter()
        .filter(|item| item.active)
        .filter_map(|item| {
            let due = i64::from(item.day_of_month);
            let (severity, message) = if due == today_day {
                (Severity::Urgent, format!("{} vence hoje", item.title))
            } else if today_day < due && due <= horizon {
                (
                    Severity::Warning,
                    format!("{} vence em breve (dia {})", item.title, item.day_of_month),
                )
            } else {
                return None;
            };
            Some(Notification {
                id: item.id,
                title: item.title.clone(),
                message,
                severity,
            })
        })
        .collect()
}
