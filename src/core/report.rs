//! Monthly report business logic.
//!
//! This module fetches a month of expenses and groups them by category. The
//! grouped totals are consumed two ways: as an unordered list for the chart and
//! sorted by value for the textual summary. All grouping functions are pure and
//! framework-agnostic; rendering to PDF lives in [`crate::core::export`].

use crate::{
    core::transaction::TransactionWithCategory,
    entities::{Category, Transaction, TransactionKind, transaction},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};
use tracing::debug;

/// Label used for expenses without a category.
pub const UNCATEGORIZED_LABEL: &str = "Sem Categoria";

/// A calendar month with inclusive first and last days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    /// First day of the month
    pub start: NaiveDate,
    /// Last day of the month, inclusive
    pub end: NaiveDate,
}

impl MonthRange {
    /// Parses a `YYYY-MM` month.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMonth`] if the input is not a valid year and month.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidMonth {
            input: input.to_string(),
        };
        let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || month.len() != 2 || !all_digits(year) || !all_digits(month) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::from_year_month(year, month).ok_or_else(invalid)
    }

    /// The month containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        // The first of a month that contains a valid date always exists
        Self::from_year_month(date.year(), date.month()).unwrap_or(Self {
            start: date,
            end: date,
        })
    }

    fn from_year_month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next.pred_opt()?,
        })
    }

    /// Whether `date` falls within the month, bounds included.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The `YYYY-MM` label of the month.
    #[must_use]
    pub fn label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One slice of the category chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// Category name, or [`UNCATEGORIZED_LABEL`]
    pub name: String,
    /// Sum of the category's expenses
    pub value: Decimal,
}

/// Fetches the user's expenses within the month with their categories, oldest first.
pub async fn fetch_month_expenses(
    db: &DatabaseConnection,
    user_id: i64,
    range: MonthRange,
) -> Result<Vec<TransactionWithCategory>> {
    debug!("Fetching expenses for user {user_id} in {range}");
    Transaction::find()
        .find_also_related(Category)
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
        .filter(transaction::Column::Date.between(range.start, range.end))
        .order_by_asc(transaction::Column::Date)
        .order_by_asc(transaction::Column::CreatedAt)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums expenses per category name within `[start, end]`.
///
/// Income rows and rows outside the range are ignored; expenses without a
/// category are grouped under [`UNCATEGORIZED_LABEL`].
#[must_use]
pub fn group_by_category(
    rows: &[TransactionWithCategory],
    start: NaiveDate,
    end: NaiveDate,
) -> BTreeMap<String, Decimal> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for (tx, category) in rows {
        if tx.kind != TransactionKind::Expense || tx.date < start || tx.date > end {
            continue;
        }
        let name = category
            .as_ref()
            .map_or(UNCATEGORIZED_LABEL, |c| c.name.as_str());
        *totals.entry(name.to_string()).or_default() += tx.amount();
    }
    totals
}

/// Converts grouped totals into chart slices. Order carries no meaning.
#[must_use]
pub fn chart_data(grouped: &BTreeMap<String, Decimal>) -> Vec<CategoryTotal> {
    grouped
        .iter()
        .map(|(name, value)| CategoryTotal {
            name: name.clone(),
            value: *value,
        })
        .collect()
}

/// Grouped totals from the largest to the smallest; equal values are ordered by name.
#[must_use]
pub fn sorted_desc(grouped: &BTreeMap<String, Decimal>) -> Vec<CategoryTotal> {
    let mut totals = chart_data(grouped);
    totals.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    totals
}

/// Sum of every row's amount.
#[must_use]
pub fn report_total(rows: &[TransactionWithCategory]) -> Decimal {
    rows.iter().map(|(tx, _)| tx.amount()).sum()
}
