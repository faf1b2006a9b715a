//! Recurring expense entity - A monthly bill due on a fixed day of the month.
//!
//! Recurring expenses never turn into transactions on their own; the user
//! "launches" one manually, which records an expense dated today.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurring expense database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_expenses")]
pub struct Model {
    /// Unique identifier for the recurring expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the bill
    pub user_id: i64,
    /// Name of the bill (e.g., "Aluguel", "Internet")
    pub title: String,
    /// Amount in cents
    pub amount_cents: i64,
    /// Expense category used when the bill is launched
    pub category_id: Option<i64>,
    /// Due day, 1..=31
    pub day_of_month: i32,
    /// Inactive bills produce no notifications
    pub active: bool,
    /// When the bill was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Amount as a currency value
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.amount_cents, 2)
    }
}

/// Defines relationships between `RecurringExpense` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each recurring expense may belong to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
