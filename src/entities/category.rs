//! Category entity - Labels for transactions and recurring expenses.
//!
//! A category with no `user_id` is shared and visible to every user.

use super::TransactionKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner, or None for a shared default category
    pub user_id: Option<i64>,
    /// Display name (e.g., "Alimentação", "Salário")
    pub name: String,
    /// Whether the category labels income or expenses
    pub kind: TransactionKind,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category labels many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One category labels many recurring expenses
    #[sea_orm(has_many = "super::recurring_expense::Entity")]
    RecurringExpenses,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::recurring_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
