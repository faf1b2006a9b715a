//! Application configuration loading from config.toml
//!
//! Every section is optional; anything left out falls back to the defaults the
//! client has always used (3-day due-soon window, 7 chart buckets, 5 recent
//! transactions, Portuguese default categories).

use crate::entities::TransactionKind;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Database URL; `DATABASE_URL` overrides it
    pub database_url: Option<String>,
    /// Dashboard settings
    pub dashboard: DashboardConfig,
    /// Recurring-bill notification settings
    pub notifications: NotificationConfig,
    /// Session lifetime settings
    pub session: SessionConfig,
    /// Category seeding settings
    pub categories: CategoriesConfig,
    /// Report/export settings
    pub report: ReportConfig,
}

/// `[dashboard]`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    /// Most recent active days kept in the daily series
    pub series_days: usize,
    /// Transactions listed under "recent"
    pub recent_transactions: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            series_days: 7,
            recent_transactions: 5,
        }
    }
}

/// `[notifications]`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    /// Look-ahead window, in days, for "due soon" warnings
    pub due_soon_days: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { due_soon_days: 3 }
    }
}

/// `[session]`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a sign-in stays valid
    pub ttl_minutes: i64,
    /// How often the expiry listener checks the current session
    pub expiry_check_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 60 * 24 * 7,
            expiry_check_seconds: 60,
        }
    }
}

/// Names provisioned for one category type
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CategorySeed {
    /// Inserted when the user has no category of this type yet
    pub defaults: Vec<String>,
    /// Ensured to exist every time categories are provisioned
    pub required: Vec<String>,
}

/// `[categories]`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CategoriesConfig {
    /// Upper bound on provisioning rounds before giving up
    pub seed_max_attempts: u32,
    /// `[categories.expense]`
    pub expense: CategorySeed,
    /// `[categories.income]`
    pub income: CategorySeed,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            seed_max_attempts: 3,
            expense: CategorySeed {
                defaults: ["Alimentação", "Transporte", "Moradia", "Lazer"]
                    .map(String::from)
                    .to_vec(),
                required: Vec::new(),
            },
            income: CategorySeed {
                defaults: ["Salário", "Freelance", "Investimentos"]
                    .map(String::from)
                    .to_vec(),
                required: Vec::new(),
            },
        }
    }
}

impl CategoriesConfig {
    /// Seed lists for the given type
    #[must_use]
    pub const fn seed_for(&self, kind: TransactionKind) -> &CategorySeed {
        match kind {
            TransactionKind::Expense => &self.expense,
            TransactionKind::Income => &self.income,
        }
    }
}

/// `[report]`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory exported PDFs are written to
    pub output_dir: PathBuf,
    /// Currency symbol printed before amounts
    pub currency_symbol: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            currency_symbol: "R$".to_string(),
        }
    }
}

/// Loads the application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from `CONFIG_PATH` (default `./config.toml`).
///
/// A missing file is not an error: the built-in defaults are used instead.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        tracing::info!("No configuration file at {path}, using defaults");
        Ok(AppConfig::default())
    }
}

impl AppConfig {
    fn validate(&self) -> Result<()> {
        if self.dashboard.series_days == 0 {
            return Err(Error::Config {
                message: "dashboard.series_days must be at least 1".to_string(),
            });
        }
        if self.categories.seed_max_attempts == 0 {
            return Err(Error::Config {
                message: "categories.seed_max_attempts must be at least 1".to_string(),
            });
        }
        if self.session.ttl_minutes <= 0 {
            return Err(Error::Config {
                message: "session.ttl_minutes must be positive".to_string(),
            });
        }
        if self.session.expiry_check_seconds == 0 {
            return Err(Error::Config {
                message: "session.expiry_check_seconds must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.dashboard.series_days, 7);
        assert_eq!(config.dashboard.recent_transactions, 5);
        assert_eq!(config.notifications.due_soon_days, 3);
        assert_eq!(config.categories.seed_max_attempts, 3);
        assert_eq!(config.categories.expense.defaults.len(), 4);
        assert_eq!(config.categories.income.defaults[0], "Salário");
        assert_eq!(config.report.currency_symbol, "R$");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
            database_url = "sqlite::memory:"

            [notifications]
            due_soon_days = 5

            [categories.expense]
            defaults = ["Mercado"]
            required = ["Contas Fixas"]
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.notifications.due_soon_days, 5);
        assert_eq!(config.categories.expense.defaults, vec!["Mercado"]);
        assert_eq!(config.categories.expense.required, vec!["Contas Fixas"]);
        // Sections not mentioned keep their defaults
        assert_eq!(config.dashboard.series_days, 7);
        assert!(config.categories.income.required.is_empty());
    }

    #[test]
    fn test_seed_for_kind() {
        let config = CategoriesConfig::default();
        assert_eq!(config.seed_for(TransactionKind::Income).defaults.len(), 3);
        assert_eq!(config.seed_for(TransactionKind::Expense).defaults.len(), 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = parse_config("[dashboard]\nseries_days = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = parse_config("[categories]\nseed_max_attempts = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = parse_config("[session]\nexpiry_check_seconds = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = parse_config("[dashboard\nseries_days = 7");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
