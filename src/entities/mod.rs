//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the backend tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod goal;
pub mod recurring_expense;
pub mod session;
pub mod transaction;
pub mod user;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use goal::{Column as GoalColumn, Entity as Goal, Model as GoalModel};
pub use recurring_expense::{
    Column as RecurringExpenseColumn, Entity as RecurringExpense, Model as RecurringExpenseModel,
};
pub use session::{Column as SessionColumn, Entity as Session, Model as SessionModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of money: shared by transactions and categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in
    #[sea_orm(string_value = "income")]
    Income,
    /// Money going out
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl TransactionKind {
    /// Lowercase wire name (`"income"` / `"expense"`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
