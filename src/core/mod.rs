//! Core business logic - framework-agnostic operations over the user's finances.
//!
//! Every function here takes a database connection and the id of the signed-in
//! user, and returns structured data the client layer renders. Nothing in this
//! module prompts, alerts or prints.

/// Balance and daily series aggregation
pub mod aggregate;
/// Category listing and default seeding
pub mod category;
/// Dashboard summary
pub mod dashboard;
/// PDF export of monthly reports
pub mod export;
/// Savings goals and progress
pub mod goal;
/// Minor-unit parsing and currency formatting
pub mod money;
/// Recurring expenses and due-date notifications
pub mod recurring;
/// Monthly expense grouping
pub mod report;
/// Transaction recording and history
pub mod transaction;
