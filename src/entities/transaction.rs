//! Transaction entity - Represents every income or expense a user records.
//!
//! Amounts are stored as non-negative integer cents; the sign is implied by `kind`.
//! Transactions are immutable once created, the only mutation is deletion.
use super::TransactionKind;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the transaction
    pub user_id: i64,
    /// Amount in minor units (cents), never negative
    pub amount_cents: i64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Category, if one was chosen
    pub category_id: Option<i64>,
    /// Free-text description
    pub description: Option<String>,
    /// Calendar date the transaction applies to
    pub date: Date,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Amount as a two-decimal currency value.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.amount_cents, 2)
    }
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction may belong to one category
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
