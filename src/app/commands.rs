//! User commands - deletes, launches and form saves.
//!
//! Each command asks for confirmation through the [`Prompt`] when the action is
//! destructive, calls into `core`, and reports backend failures as
//! `"Erro ao <action>: <message>"` alerts. The error is still returned so the
//! caller can decide whether to refresh.

use super::{context::AppContext, prompt::Prompt};
use crate::{
    core::{
        category::ensure_default_categories,
        goal::{self, GoalForm},
        money,
        recurring::{self, RecurringForm},
        transaction::{self, TransactionForm},
    },
    entities::{
        GoalModel, RecurringExpenseModel, TransactionKind, TransactionModel, category,
    },
    errors::Result,
};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Confirmation shown before deleting a transaction.
pub const CONFIRM_DELETE_TRANSACTION: &str = "Tem certeza que deseja excluir esta transação?";
/// Confirmation shown before deleting a goal.
pub const CONFIRM_DELETE_GOAL: &str = "Tem certeza que deseja excluir esta meta?";
/// Confirmation shown before deleting a recurring expense.
pub const CONFIRM_DELETE_RECURRING: &str = "Tem certeza que deseja excluir esta conta recorrente?";
/// Notice shown after a successful launch.
pub const LAUNCH_SUCCESS: &str = "Despesa lançada com sucesso!";

/// What happened to a command that needed confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The action ran
    Done,
    /// The user declined; nothing was changed
    Cancelled,
}

fn alert_on_error<T>(prompt: &dyn Prompt, action: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        warn!("Failed to {action}: {e}");
        prompt.alert(&format!("Erro ao {action}: {e}"));
    }
    result
}

async fn signed_in_user(ctx: &AppContext) -> Result<i64> {
    Ok(ctx.require_session().await?.user_id())
}

/// Deletes a transaction after confirmation.
pub async fn delete_transaction(
    ctx: &AppContext,
    prompt: &dyn Prompt,
    transaction_id: i64,
) -> Result<CommandOutcome> {
    let user_id = signed_in_user(ctx).await?;
    if !prompt.confirm(CONFIRM_DELETE_TRANSACTION) {
        return Ok(CommandOutcome::Cancelled);
    }
    let result = transaction::delete_transaction(&ctx.database, user_id, transaction_id).await;
    alert_on_error(prompt, "excluir transação", result)?;
    Ok(CommandOutcome::Done)
}

/// Deletes a goal after confirmation.
pub async fn delete_goal(ctx: &AppContext, prompt: &dyn Prompt, goal_id: i64) -> Result<CommandOutcome> {
    let user_id = signed_in_user(ctx).await?;
    if !prompt.confirm(CONFIRM_DELETE_GOAL) {
        return Ok(CommandOutcome::Cancelled);
    }
    let result = goal::delete_goal(&ctx.database, user_id, goal_id).await;
    alert_on_error(prompt, "excluir meta", result)?;
    Ok(CommandOutcome::Done)
}

/// Deletes a recurring expense after confirmation.
pub async fn delete_recurring(
    ctx: &AppContext,
    prompt: &dyn Prompt,
    recurring_id: i64,
) -> Result<CommandOutcome> {
    let user_id = signed_in_user(ctx).await?;
    if !prompt.confirm(CONFIRM_DELETE_RECURRING) {
        return Ok(CommandOutcome::Cancelled);
    }
    let result = recurring::delete_recurring(&ctx.database, user_id, recurring_id).await;
    alert_on_error(prompt, "excluir conta recorrente", result)?;
    Ok(CommandOutcome::Done)
}

/// Text of the launch confirmation, e.g.
/// `Deseja lançar a despesa "Aluguel" no valor de R$ 1.500,00 hoje?`.
#[must_use]
pub fn launch_confirmation(item: &RecurringExpenseModel, symbol: &str) -> String {
    format!(
        "Deseja lançar a despesa \"{}\" no valor de {} hoje?",
        item.title,
        money::format_currency(item.amount(), symbol)
    )
}

/// Records a bill as today's expense after confirmation.
pub async fn launch_recurring(
    ctx: &AppContext,
    prompt: &dyn Prompt,
    item: &RecurringExpenseModel,
    today: NaiveDate,
) -> Result<CommandOutcome> {
    let user_id = signed_in_user(ctx).await?;
    if !prompt.confirm(&launch_confirmation(item, ctx.currency())) {
        return Ok(CommandOutcome::Cancelled);
    }
    let result = recurring::launch_recurring(&ctx.database, user_id, item.id, today).await;
    alert_on_error(prompt, "lançar", result)?;
    prompt.alert(LAUNCH_SUCCESS);
    Ok(CommandOutcome::Done)
}

/// Makes sure the form for `kind` has categories to choose from.
pub async fn prepare_categories(
    ctx: &AppContext,
    prompt: &dyn Prompt,
    kind: TransactionKind,
) -> Result<Vec<category::Model>> {
    let user_id = signed_in_user(ctx).await?;
    let result =
        ensure_default_categories(&ctx.database, user_id, kind, &ctx.config.categories).await;
    alert_on_error(prompt, "carregar categorias", result)
}

/// Validates and records the transaction form.
pub async fn save_transaction(
    ctx: &AppContext,
    prompt: &dyn Prompt,
    form: &TransactionForm,
) -> Result<TransactionModel> {
    let user_id = signed_in_user(ctx).await?;
    let result = match form.validate() {
        Ok(draft) => transaction::create_transaction(&ctx.database, user_id, draft).await,
        Err(e) => Err(e),
    };
    alert_on_error(prompt, "salvar transação", result)
}

/// Validates the goal form and creates a goal, or updates `goal_id` when editing.
pub async fn save_goal(
    ctx: &AppContext,
    prompt: &dyn Prompt,
    goal_id: Option<i64>,
    form: &GoalForm,
) -> Result<GoalModel> {
    let user_id = signed_in_user(ctx).await?;
    let result = match (form.validate(), goal_id) {
        (Ok(draft), Some(id)) => goal::update_goal(&ctx.database, user_id, id, draft).await,
        (Ok(draft), None) => goal::create_goal(&ctx.database, user_id, draft).await,
        (Err(e), _) => Err(e),
    };
    alert_on_error(prompt, "salvar meta", result)
}

/// Validates the recurring form and creates a bill, or updates `recurring_id` when editing.
pub async fn save_recurring(
    ctx: &AppContext,
    prompt: &dyn Prompt,
    recurring_id: Option<i64>,
    form: &RecurringForm,
) -> Result<RecurringExpenseModel> {
    let user_id = signed_in_user(ctx).await?;
    let result = match (form.validate(), recurring_id) {
        (Ok(draft), Some(id)) => recurring::update_recurring(&ctx.database, user_id, id, draft).await,
        (Ok(draft), None) => recurring::create_recurring(&ctx.database, user_id, draft).await,
        (Err(e), _) => Err(e),
    };
    let saved = alert_on_error(prompt, "salvar conta recorrente", result)?;
    info!("Saved recurring expense {}", saved.id);
    Ok(saved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        auth::{AuthProvider, Profile},
        config::AppConfig,
        core::transaction::get_transactions_for_user,
        errors::Error,
        test_utils::*,
    };
    use sea_orm::ConnectionTrait;

    async fn signed_in_context() -> Result<(AppContext, i64)> {
        let db = setup_test_db().await?;
        let ctx = AppContext::new(db, AppConfig::default());
        let user = ctx
            .auth
            .sign_up("maria@example.com", "segredo123", Profile::default())
            .await?;
        ctx.session
            .sign_in(&ctx.auth, "maria@example.com", "segredo123")
            .await?;
        Ok((ctx, user.id))
    }

    #[tokio::test]
    async fn test_cancelled_delete_changes_nothing() -> Result<()> {
        let (ctx, user_id) = signed_in_context().await?;
        let tx = create_test_transaction(&ctx.database, user_id, TransactionKind::Expense, 100, None, date(2024, 5, 1)).await?;

        let prompt = RecordingPrompt::answering(false);
        let outcome = delete_transaction(&ctx, &prompt, tx.id).await?;
        assert_eq!(outcome, CommandOutcome::Cancelled);
        assert_eq!(prompt.confirmations(), vec![CONFIRM_DELETE_TRANSACTION]);
        assert_eq!(get_transactions_for_user(&ctx.database, user_id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_row() -> Result<()> {
        let (ctx, user_id) = signed_in_context().await?;
        let tx = create_test_transaction(&ctx.database, user_id, TransactionKind::Expense, 100, None, date(2024, 5, 1)).await?;

        let prompt = RecordingPrompt::answering(true);
        assert_eq!(delete_transaction(&ctx, &prompt, tx.id).await?, CommandOutcome::Done);
        assert!(get_transactions_for_user(&ctx.database, user_id).await?.is_empty());

        // A second delete of the same id surfaces the backend message
        assert!(delete_transaction(&ctx, &prompt, tx.id).await.is_err());
        assert_eq!(prompt.alerts().len(), 1);
        assert!(prompt.alerts()[0].starts_with("Erro ao excluir transação: "));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_goal_and_recurring() -> Result<()> {
        let (ctx, user_id) = signed_in_context().await?;
        let prompt = RecordingPrompt::answering(true);
        let goal = create_test_goal(&ctx.database, user_id, "Reserva", 10_000, 0).await?;
        let bill = create_test_recurring(&ctx.database, user_id, "Internet", 9_990, 12).await?;

        assert_eq!(delete_goal(&ctx, &prompt, goal.id).await?, CommandOutcome::Done);
        assert_eq!(delete_recurring(&ctx, &prompt, bill.id).await?, CommandOutcome::Done);
        assert_eq!(
            prompt.confirmations(),
            vec![CONFIRM_DELETE_GOAL, CONFIRM_DELETE_RECURRING]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_launch_recurring_confirms_with_amount() -> Result<()> {
        let (ctx, user_id) = signed_in_context().await?;
        let bill = create_test_recurring(&ctx.database, user_id, "Aluguel", 150_000, 5).await?;

        let declined = RecordingPrompt::answering(false);
        assert_eq!(
            launch_recurring(&ctx, &declined, &bill, date(2024, 5, 5)).await?,
            CommandOutcome::Cancelled
        );
        assert_eq!(
            declined.confirmations(),
            vec!["Deseja lançar a despesa \"Aluguel\" no valor de R$ 1.500,00 hoje?"]
        );
        assert!(get_transactions_for_user(&ctx.database, user_id).await?.is_empty());

        let accepted = RecordingPrompt::answering(true);
        launch_recurring(&ctx, &accepted, &bill, date(2024, 5, 5)).await?;
        assert_eq!(accepted.alerts(), vec![LAUNCH_SUCCESS]);
        let txs = get_transactions_for_user(&ctx.database, user_id).await?;
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].date, date(2024, 5, 5));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_forms() -> Result<()> {
        let (ctx, _) = signed_in_context().await?;
        let prompt = RecordingPrompt::default();

        let categories = prepare_categories(&ctx, &prompt, TransactionKind::Expense).await?;
        let mut form = TransactionForm::new(TransactionKind::Expense, date(2024, 5, 1));
        form.amount = "2500".to_string();
        form.category_id = Some(categories[0].id);
        let saved = save_transaction(&ctx, &prompt, &form).await?;
        assert_eq!(saved.amount_cents, 2_500);

        let goal_form = GoalForm {
            title: "Viagem".to_string(),
            target_amount: "100000".to_string(),
            ..GoalForm::default()
        };
        let created = save_goal(&ctx, &prompt, None, &goal_form).await?;
        let mut edit = GoalForm::from_goal(&created);
        edit.current_amount = "5000".to_string();
        let updated = save_goal(&ctx, &prompt, Some(created.id), &edit).await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.current_cents, 5_000);

        let bill_form = RecurringForm {
            title: "Luz".to_string(),
            amount: "18000".to_string(),
            ..RecurringForm::default()
        };
        let bill = save_recurring(&ctx, &prompt, None, &bill_form).await?;
        assert_eq!(bill.day_of_month, 5);
        assert!(prompt.alerts().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_form_is_alerted() -> Result<()> {
        let (ctx, _) = signed_in_context().await?;
        let prompt = RecordingPrompt::default();

        let goal_form = GoalForm {
            title: "Nada".to_string(),
            target_amount: "0".to_string(),
            ..GoalForm::default()
        };
        let result = save_goal(&ctx, &prompt, None, &goal_form).await;
        assert!(matches!(result, Err(Error::InvalidGoal { .. })));
        assert!(prompt.alerts()[0].starts_with("Erro ao salvar meta: "));
        Ok(())
    }

    #[tokio::test]
    async fn test_prepare_categories_alerts_backend_message() -> Result<()> {
        let (ctx, _) = signed_in_context().await?;
        ctx.database.execute_unprepared("DROP TABLE categories").await?;
        let prompt = RecordingPrompt::default();

        let result = prepare_categories(&ctx, &prompt, TransactionKind::Expense).await;
        assert!(matches!(result, Err(Error::CategorySeeding { .. })));
        let alerts = prompt.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Erro ao carregar categorias: "));
        assert!(alerts[0].contains("no such table: categories"), "{}", alerts[0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_commands_require_session() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = AppContext::new(db, AppConfig::default());
        ctx.session.restore(&ctx.auth, None).await?;
        let prompt = RecordingPrompt::answering(true);

        assert!(matches!(
            delete_goal(&ctx, &prompt, 1).await,
            Err(Error::NotAuthenticated)
        ));
        assert!(prompt.confirmations().is_empty());
        Ok(())
    }
}
