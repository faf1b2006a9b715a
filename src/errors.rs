//! Unified error type for `FinanceBuddy`.
//!
//! Every fallible operation in the crate returns [`Result`]. Backend failures keep
//! their raw message so the interface layer can show it to the user verbatim.

use rust_decimal::Decimal;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The database (backend) rejected or failed an operation
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A monetary amount is negative, has too many fraction digits or does not fit
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// A minor-unit digit string could not be turned into an amount
    #[error("Invalid amount input: '{input}'")]
    InvalidAmountInput {
        /// The raw text that was entered
        input: String,
    },

    /// A goal failed validation (blank title, non-positive target, ...)
    #[error("Invalid goal: {reason}")]
    InvalidGoal {
        /// Why the goal was rejected
        reason: String,
    },

    /// A form field failed validation
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A `YYYY-MM` month could not be parsed
    #[error("Invalid month '{input}', expected YYYY-MM")]
    InvalidMonth {
        /// The raw month text
        input: String,
    },

    /// A row does not exist or is not visible to the current user
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of row ("transaction", "goal", ...)
        entity: &'static str,
        /// Requested id
        id: i64,
    },

    /// Default categories could not be provisioned within the attempt limit
    #[error("Could not provision {kind} categories after {attempts} attempts: {reason}")]
    CategorySeeding {
        /// Category type being seeded
        kind: String,
        /// Attempts made
        attempts: u32,
        /// Outcome of the last attempt, including the backend message when it failed
        reason: String,
    },

    /// Email/password pair did not match an account
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Sign-up with an email that already has an account
    #[error("User already registered: {email}")]
    EmailTaken {
        /// The normalized email
        email: String,
    },

    /// A protected operation was attempted without a session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The stored session token is unknown or expired
    #[error("Session expired")]
    SessionExpired,

    /// Password hashing failed
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Hasher message
        message: String,
    },

    /// Export was requested for a report without rows
    #[error("Nothing to export for {month}")]
    EmptyReport {
        /// The `YYYY-MM` month
        month: String,
    },

    /// PDF rendering failed
    #[error("PDF error: {message}")]
    Pdf {
        /// Renderer message
        message: String,
    },

    /// I/O failure (config file, export output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable is missing
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
