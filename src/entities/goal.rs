//! Goal entity - A savings target with a current amount saved so far.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The six palette colours a goal card can use, stored as their hex value.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum GoalColor {
    /// Roxo
    #[default]
    #[sea_orm(string_value = "#8b5cf6")]
    Purple,
    /// Azul
    #[sea_orm(string_value = "#3b82f6")]
    Blue,
    /// Verde
    #[sea_orm(string_value = "#22c55e")]
    Green,
    /// Laranja
    #[sea_orm(string_value = "#f97316")]
    Orange,
    /// Rosa
    #[sea_orm(string_value = "#ec4899")]
    Pink,
    /// Vermelho
    #[sea_orm(string_value = "#ef4444")]
    Red,
}

impl GoalColor {
    /// Hex value used when rendering
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Purple => "#8b5cf6",
            Self::Blue => "#3b82f6",
            Self::Green => "#22c55e",
            Self::Orange => "#f97316",
            Self::Pink => "#ec4899",
            Self::Red => "#ef4444",
        }
    }
}

/// Goal database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    /// Unique identifier for the goal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the goal
    pub user_id: i64,
    /// What the user is saving for
    pub title: String,
    /// Target in cents, always positive
    pub target_cents: i64,
    /// Saved so far in cents
    pub current_cents: i64,
    /// Optional date the user wants to reach the target by
    pub deadline: Option<Date>,
    /// Card colour
    pub color: GoalColor,
    /// When the goal was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Target as a currency value
    #[must_use]
    pub fn target_amount(&self) -> Decimal {
        Decimal::new(self.target_cents, 2)
    }

    /// Current savings as a currency value
    #[must_use]
    pub fn current_amount(&self) -> Decimal {
        Decimal::new(self.current_cents, 2)
    }
}

/// `Goal` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
