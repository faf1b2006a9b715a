use chrono::{Local, NaiveDate};
use dotenvy::dotenv;
use finance_buddy::{
    app::{
        AppContext, ConsolePrompt, Prompt,
        views::{DashboardView, GoalsView, LoginView, RecurringView, RegisterView, ReportsView},
    },
    config::{self, database},
    core::money,
    errors::{Error, Result},
};
use std::{env, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Restores a stored session or signs in with credentials from the environment.
///
/// `FINANCE_BUDDY_REGISTER=1` registers the account first.
async fn sign_in(ctx: &AppContext, prompt: &dyn Prompt) -> Result<()> {
    let token = env::var("FINANCE_BUDDY_SESSION").ok();
    if let Err(e) = ctx.session.restore(&ctx.auth, token.as_deref()).await {
        warn!("Stored session could not be restored: {e}");
    }
    if ctx.session.require_user().is_ok() {
        return Ok(());
    }

    let email = env::var("FINANCE_BUDDY_EMAIL")
        .inspect_err(|e| error!("FINANCE_BUDDY_EMAIL not set: {e}"))?;
    let password = env::var("FINANCE_BUDDY_PASSWORD")
        .inspect_err(|e| error!("FINANCE_BUDDY_PASSWORD not set: {e}"))?;

    if env::var("FINANCE_BUDDY_REGISTER").is_ok_and(|v| v == "1") {
        let mut register = RegisterView {
            full_name: env::var("FINANCE_BUDDY_NAME").unwrap_or_default(),
            email: email.clone(),
            password: password.clone(),
            ..RegisterView::default()
        };
        if !register.submit(ctx, prompt).await {
            warn!(
                "Registration failed: {}",
                register.error.unwrap_or_default()
            );
        }
    }

    let mut login = LoginView {
        email,
        password,
        ..LoginView::default()
    };
    if login.submit(ctx).await {
        Ok(())
    } else {
        error!("Sign-in failed: {}", login.error.unwrap_or_default());
        Err(Error::NotAuthenticated)
    }
}

async fn show_overview(ctx: &AppContext, prompt: &dyn Prompt, today: NaiveDate) -> Result<()> {
    let symbol = ctx.currency();

    let mut dashboard = DashboardView::default();
    dashboard.refresh(ctx, prompt).await?;
    for (label, amount) in dashboard.balance_cards(symbol) {
        println!("{label}: {amount}");
    }
    if !dashboard.summary.data.has_data() {
        println!("Sem dados para exibir");
    }
    for point in &dashboard.summary.data.series {
        println!(
            "  {}  +{}  -{}",
            point.date.format("%d/%m"),
            money::format_decimal(point.income),
            money::format_decimal(point.expense)
        );
    }

    let mut recurring = RecurringView::default();
    recurring.refresh(ctx, prompt, today).await?;
    for notification in &recurring.notifications {
        println!("[{:?}] {}", notification.severity, notification.message);
    }

    let mut goals = GoalsView::default();
    goals.refresh(ctx, prompt).await?;
    for card in goals.cards(symbol) {
        println!("{} - {}% ({})", card.title, card.progress, card.remaining);
    }

    let mut reports = ReportsView::new(today);
    if let Ok(month) = env::var("REPORT_MONTH") {
        reports.select_month(&month)?;
    }
    reports.refresh(ctx, prompt).await?;
    for total in reports.summary() {
        println!("{}: {}", total.name, money::format_currency(total.value, symbol));
    }
    if reports.can_export() {
        let path = reports.export(ctx, prompt, today).await?;
        println!("Relatório salvo em {}", path.display());
    } else {
        info!("No expenses in {}, skipping export", reports.month);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Connect and create tables
    let database_url = database::get_database_url(app_config.database_url.as_deref());
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Resolve the session and watch for expiry
    let check_every = Duration::from_secs(app_config.session.expiry_check_seconds);
    let ctx = AppContext::new(db, app_config);
    let listener = ctx.session.spawn_expiry_listener(check_every);
    let prompt = ConsolePrompt::default();
    sign_in(&ctx, &prompt).await?;

    // 6. Render the pages once
    let result = show_overview(&ctx, &prompt, Local::now().date_naive()).await;
    listener.abort();
    result
}
