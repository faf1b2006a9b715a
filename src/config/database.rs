//! Database configuration module for `FinanceBuddy`.
//!
//! This module handles the backend connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.

use crate::entities::{Category, Goal, RecurringExpense, Session, Transaction, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::debug;

/// Default `SQLite` location used when neither `DATABASE_URL` nor the config file set one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/finance_buddy.sqlite?mode=rwc";

/// Resolves the database URL: `DATABASE_URL` wins over the configured value.
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        configured
            .map_or_else(|| DEFAULT_DATABASE_URL.to_string(), ToString::to_string)
    })
}

/// Establishes a connection to the database at `database_url`.
///
/// For a file-backed `SQLite` URL the parent directory is created first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_parent_dir(database_url) {
        std::fs::create_dir_all(parent)?;
    }
    debug!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let file = path.split('?').next()?;
    Path::new(file)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Creates every backend table that does not exist yet.
///
/// Tables are created in dependency order (users before sessions, categories
/// before the rows that reference them).
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Session),
        schema.create_table_from_entity(Category),
        schema.create_table_from_entity(Transaction),
        schema.create_table_from_entity(Goal),
        schema.create_table_from_entity(RecurringExpense),
    ];

    for statement in &mut statements {
        db.execute(builder.build(statement.if_not_exists())).await?;
    }

    Ok(())
}
