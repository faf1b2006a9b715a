//! Balance and time-series aggregation over a user's transactions.
//!
//! These functions are pure and order-independent so that a view can re-fetch
//! and recompute at any time, in any order, with the same result.

use crate::entities::{TransactionKind, transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of active days kept in the dashboard chart.
pub const DEFAULT_SERIES_DAYS: usize = 7;

/// Income, expense and net totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    /// Sum of all income
    pub income: Decimal,
    /// Sum of all expenses
    pub expense: Decimal,
    /// `income - expense`
    pub total: Decimal,
}

/// One bucket of the daily chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    /// The bucket's calendar date
    pub date: NaiveDate,
    /// Income recorded on that date
    pub income: Decimal,
    /// Expenses recorded on that date
    pub expense: Decimal,
}

/// Sums income and expenses; an empty list gives an all-zero balance.
#[must_use]
pub fn compute_balance(transactions: &[transaction::Model]) -> Balance {
    let (income, expense) = transactions.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(income, expense), tx| match tx.kind {
            TransactionKind::Income => (income + tx.amount(), expense),
            TransactionKind::Expense => (income, expense + tx.amount()),
        },
    );

    Balance {
        income,
        expense,
        total: income - expense,
    }
}

/// Groups transactions per date and keeps the 7 most recent active days, oldest first.
#[must_use]
pub fn compute_daily_series(transactions: &[transaction::Model]) -> Vec<DailyPoint> {
    compute_daily_series_with_limit(transactions, DEFAULT_SERIES_DAYS)
}

/// Groups transactions per date, sorts ascending and keeps the last `limit` buckets.
///
/// Only dates that actually have transactions produce a bucket, so the result
/// covers the most recent *active* days rather than a calendar window.
#[must_use]
pub fn compute_daily_series_with_limit(
    transactions: &[transaction::Model],
    limit: usize,
) -> Vec<DailyPoint> {
    let mut buckets: BTreeMap<NaiveDate, DailyPoint> = BTreeMap::new();

    for tx in transactions {
        let point = buckets.entry(tx.date).or_insert(DailyPoint {
            date: tx.date,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        });
        match tx.kind {
            TransactionKind::Income => point.income += tx.amount(),
            TransactionKind::Expense => point.expense += tx.amount(),
        }
    }

    let skip = buckets.len().saturating_sub(limit);
    buckets.into_values().skip(skip).collect()
}
