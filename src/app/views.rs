//! Screen models: what each page fetches and how it turns data into display rows.
//!
//! Every protected view waits for the session to resolve before fetching, takes
//! a [`FetchTicket`](super::guard::FetchTicket) per fetch and applies the result
//! through [`Loadable`], so a late or stale response never overwrites newer data.

use super::{
    context::AppContext,
    guard::{Loadable, ViewGuard},
    prompt::Prompt,
};
use crate::{
    auth::{AuthProvider, Profile},
    core::{
        dashboard::{DashboardSummary, load_dashboard},
        export::export_month_report,
        goal::{self, list_goals},
        money,
        recurring::{Notification, RecurringWithCategory, evaluate_due, list_recurring},
        report::{CategoryTotal, MonthRange, chart_data, fetch_month_expenses, group_by_category, report_total, sorted_desc},
        transaction::{TransactionWithCategory, display_category, display_description, format_date_br, list_transactions},
    },
    entities::{TransactionKind, goal::GoalColor, goal::Model as GoalModel},
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info;

/// Dashboard page: balance cards, daily chart and latest transactions.
#[derive(Debug, Default)]
pub struct DashboardView {
    guard: ViewGuard,
    /// Loaded summary
    pub summary: Loadable<DashboardSummary>,
}

impl DashboardView {
    /// Handle used to unmount the view from outside.
    #[must_use]
    pub fn guard(&self) -> ViewGuard {
        self.guard.clone()
    }

    /// Re-fetches and recomputes the summary.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::NotAuthenticated`] when nobody is signed in.
    pub async fn refresh(&mut self, ctx: &AppContext, prompt: &dyn Prompt) -> Result<()> {
        let session = ctx.require_session().await?;
        let ticket = self.guard.begin();
        self.summary.start();
        let result = load_dashboard(&ctx.database, session.user_id(), &ctx.config.dashboard).await;
        self.summary.apply(&ticket, result, prompt, "carregar painel");
        Ok(())
    }

    /// Balance cards as `(label, formatted amount)`.
    #[must_use]
    pub fn balance_cards(&self, symbol: &str) -> [(&'static str, String); 3] {
        let balance = &self.summary.data.balance;
        [
            ("Saldo Total", money::format_currency(balance.total, symbol)),
            ("Receitas", money::format_currency(balance.income, symbol)),
            ("Despesas", money::format_currency(balance.expense, symbol)),
        ]
    }
}

/// One line of the transaction history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    /// Transaction id, used by the delete command
    pub id: i64,
    /// `dd/mm/yyyy`
    pub date: String,
    /// Description or "Sem descrição"
    pub description: String,
    /// Category name or "Geral"
    pub category: String,
    /// Signed amount, e.g. "- R$ 25,00"
    pub amount: String,
}

/// Transaction history page.
#[derive(Debug, Default)]
pub struct TransactionsView {
    guard: ViewGuard,
    /// Loaded transactions, newest first
    pub rows: Loadable<Vec<TransactionWithCategory>>,
}

impl TransactionsView {
    /// Handle used to unmount the view from outside.
    #[must_use]
    pub fn guard(&self) -> ViewGuard {
        self.guard.clone()
    }

    /// Re-fetches the history.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::NotAuthenticated`] when nobody is signed in.
    pub async fn refresh(&mut self, ctx: &AppContext, prompt: &dyn Prompt) -> Result<()> {
        let session = ctx.require_session().await?;
        let ticket = self.guard.begin();
        self.rows.start();
        let result = list_transactions(&ctx.database, session.user_id()).await;
        self.rows.apply(&ticket, result, prompt, "carregar transações");
        Ok(())
    }

    /// Rows formatted for the table.
    #[must_use]
    pub fn history(&self, symbol: &str) -> Vec<HistoryRow> {
        self.rows
            .data
            .iter()
            .map(|(tx, category)| HistoryRow {
                id: tx.id,
                date: format_date_br(tx.date),
                description: display_description(tx).to_string(),
                category: display_category(category.as_ref()).to_string(),
                amount: money::format_signed_currency(
                    tx.amount(),
                    tx.kind == TransactionKind::Income,
                    symbol,
                ),
            })
            .collect()
    }
}

/// A goal as drawn on its card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalCard {
    /// Goal id
    pub id: i64,
    /// Title
    pub title: String,
    /// Percent complete, 0..=100
    pub progress: u8,
    /// "R$ 250,00 de R$ 1.000,00"
    pub amounts: String,
    /// "Faltam R$ 750,00", or "Meta atingida!" once complete
    pub remaining: String,
    /// `dd/mm/yyyy` deadline, if any
    pub deadline: Option<String>,
    /// Card colour
    pub color: GoalColor,
}

impl GoalCard {
    fn from_goal(item: &GoalModel, symbol: &str) -> Self {
        let remaining = goal::remaining(item);
        Self {
            id: item.id,
            title: item.title.clone(),
            progress: goal::progress(item),
            amounts: format!(
                "{} de {}",
                money::format_currency(item.current_amount(), symbol),
                money::format_currency(item.target_amount(), symbol)
            ),
            remaining: if remaining == Decimal::ZERO {
                "Meta atingida!".to_string()
            } else {
                format!("Faltam {}", money::format_currency(remaining, symbol))
            },
            deadline: item.deadline.map(format_date_br),
            color: item.color,
        }
    }
}

/// Savings goals page.
#[derive(Debug, Default)]
pub struct GoalsView {
    guard: ViewGuard,
    /// Loaded goals, newest first
    pub goals: Loadable<Vec<GoalModel>>,
}

impl GoalsView {
    /// Handle used to unmount the view from outside.
    #[must_use]
    pub fn guard(&self) -> ViewGuard {
        self.guard.clone()
    }

    /// Re-fetches the goals.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::NotAuthenticated`] when nobody is signed in.
    pub async fn refresh(&mut self, ctx: &AppContext, prompt: &dyn Prompt) -> Result<()> {
        let session = ctx.require_session().await?;
        let ticket = self.guard.begin();
        self.goals.start();
        let result = list_goals(&ctx.database, session.user_id()).await;
        self.goals.apply(&ticket, result, prompt, "carregar metas");
        Ok(())
    }

    /// Goals formatted as cards.
    #[must_use]
    pub fn cards(&self, symbol: &str) -> Vec<GoalCard> {
        self.goals
            .data
            .iter()
            .map(|g| GoalCard::from_goal(g, symbol))
            .collect()
    }
}

/// Recurring expenses page with its due-date notifications.
#[derive(Debug, Default)]
pub struct RecurringView {
    guard: ViewGuard,
    /// Loaded bills, by due day
    pub items: Loadable<Vec<RecurringWithCategory>>,
    /// Notifications computed on the last successful refresh
    pub notifications: Vec<Notification>,
}

impl RecurringView {
    /// Handle used to unmount the view from outside.
    #[must_use]
    pub fn guard(&self) -> ViewGuard {
        self.guard.clone()
    }

    /// Re-fetches the bills and recomputes notifications from scratch for `today`.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::NotAuthenticated`] when nobody is signed in.
    pub async fn refresh(
        &mut self,
        ctx: &AppContext,
        prompt: &dyn Prompt,
        today: NaiveDate,
    ) -> Result<()> {
        let session = ctx.require_session().await?;
        let ticket = self.guard.begin();
        self.items.start();
        let result = list_recurring(&ctx.database, session.user_id()).await;
        if self.items.apply(&ticket, result, prompt, "carregar contas fixas") {
            let bills: Vec<_> = self.items.data.iter().map(|(r, _)| r.clone()).collect();
            self.notifications =
                evaluate_due(&bills, today, ctx.config.notifications.due_soon_days);
        }
        Ok(())
    }
}

/// Monthly report page.
#[derive(Debug)]
pub struct ReportsView {
    guard: ViewGuard,
    /// Selected month
    pub month: MonthRange,
    /// The month's expenses, oldest first
    pub rows: Loadable<Vec<TransactionWithCategory>>,
}

impl ReportsView {
    /// A report view opened on the month containing `today`.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            guard: ViewGuard::new(),
            month: MonthRange::containing(today),
            rows: Loadable::default(),
        }
    }

    /// Handle used to unmount the view from outside.
    #[must_use]
    pub fn guard(&self) -> ViewGuard {
        self.guard.clone()
    }

    /// Selects another `YYYY-MM` month. Call [`Self::refresh`] afterwards.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::InvalidMonth`] for malformed input; the selection is unchanged.
    pub fn select_month(&mut self, input: &str) -> Result<()> {
        self.month = MonthRange::parse(input)?;
        Ok(())
    }

    /// Re-fetches the selected month.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::NotAuthenticated`] when nobody is signed in.
    pub async fn refresh(&mut self, ctx: &AppContext, prompt: &dyn Prompt) -> Result<()> {
        let session = ctx.require_session().await?;
        let ticket = self.guard.begin();
        self.rows.start();
        let result = fetch_month_expenses(&ctx.database, session.user_id(), self.month).await;
        self.rows.apply(&ticket, result, prompt, "carregar relatório");
        Ok(())
    }

    /// Chart slices; order carries no meaning.
    #[must_use]
    pub fn chart(&self) -> Vec<CategoryTotal> {
        chart_data(&group_by_category(&self.rows.data, self.month.start, self.month.end))
    }

    /// Category totals from the largest down.
    #[must_use]
    pub fn summary(&self) -> Vec<CategoryTotal> {
        sorted_desc(&group_by_category(&self.rows.data, self.month.start, self.month.end))
    }

    /// Sum of the month's expenses.
    #[must_use]
    pub fn total(&self) -> Decimal {
        report_total(&self.rows.data)
    }

    /// Export is only offered for a month with expenses.
    #[must_use]
    pub fn can_export(&self) -> bool {
        !self.rows.data.is_empty()
    }

    /// Writes the month's PDF; failures are alerted.
    pub async fn export(
        &self,
        ctx: &AppContext,
        prompt: &dyn Prompt,
        today: NaiveDate,
    ) -> Result<PathBuf> {
        let session = ctx.require_session().await?;
        let exported = export_month_report(
            &ctx.database,
            session.user_id(),
            self.month,
            today,
            &ctx.config.report,
        )
        .await;
        if let Err(e) = &exported {
            prompt.alert(&format!("Erro ao exportar relatório: {e}"));
        }
        exported
    }
}

/// Login page with its inline error region.
#[derive(Debug, Clone, Default)]
pub struct LoginView {
    /// Email field
    pub email: String,
    /// Password field
    pub password: String,
    /// Inline error from the last attempt
    pub error: Option<String>,
    /// A sign-in is in flight
    pub loading: bool,
}

impl LoginView {
    /// Attempts to sign in. Returns whether it succeeded; on failure the
    /// message is shown inline instead of alerted.
    pub async fn submit(&mut self, ctx: &AppContext) -> bool {
        self.error = None;
        self.loading = true;
        let result = ctx.session.sign_in(&ctx.auth, &self.email, &self.password).await;
        self.loading = false;
        match result {
            Ok(_) => {
                self.password.clear();
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }
}

/// Registration page with its inline error region.
#[derive(Debug, Clone, Default)]
pub struct RegisterView {
    /// Full name field
    pub full_name: String,
    /// Email field
    pub email: String,
    /// Password field
    pub password: String,
    /// Inline error from the last attempt
    pub error: Option<String>,
    /// A sign-up is in flight
    pub loading: bool,
}

impl RegisterView {
    /// Creates the account. The user is not signed in afterwards and is told
    /// to log in; on failure the message is shown inline.
    pub async fn submit(&mut self, ctx: &AppContext, prompt: &dyn Prompt) -> bool {
        self.error = None;
        self.loading = true;
        let profile = Profile {
            full_name: self.full_name.clone(),
        };
        let result = ctx.auth.sign_up(&self.email, &self.password, profile).await;
        self.loading = false;
        match result {
            Ok(user) => {
                info!("Account {} created, redirecting to login", user.id);
                prompt.alert("Cadastro realizado! Faça login para continuar.");
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }
}
