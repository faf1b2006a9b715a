//! Dashboard summary: balance, daily chart and latest transactions.

use crate::{
    config::app::DashboardConfig,
    core::{
        aggregate::{Balance, DailyPoint, compute_balance, compute_daily_series_with_limit},
        transaction::get_transactions_for_user,
    },
    entities::transaction,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Everything the dashboard view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    /// Totals over all transactions
    pub balance: Balance,
    /// Most recent active days, oldest first
    pub series: Vec<DailyPoint>,
    /// Newest transactions first
    pub recent: Vec<transaction::Model>,
}

impl DashboardSummary {
    /// Builds the summary from transactions already ordered newest first.
    #[must_use]
    pub fn from_transactions(transactions: &[transaction::Model], config: &DashboardConfig) -> Self {
        Self {
            balance: compute_balance(transactions),
            series: compute_daily_series_with_limit(transactions, config.series_days),
            recent: transactions
                .iter()
                .take(config.recent_transactions)
                .cloned()
                .collect(),
        }
    }

    /// Whether the chart has anything to show.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.series.is_empty()
    }
}

/// Fetches the user's transactions and summarizes them.
pub async fn load_dashboard(
    db: &DatabaseConnection,
    user_id: i64,
    config: &DashboardConfig,
) -> Result<DashboardSummary> {
    let transactions = get_transactions_for_user(db, user_id).await?;
    Ok(DashboardSummary::from_transactions(&transactions, config))
}
