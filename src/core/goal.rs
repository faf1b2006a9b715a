//! Goal business logic - savings goals and their progress.
//!
//! Goals are validated at the form boundary: a goal with a blank title or a
//! non-positive target is rejected before it reaches the backend, so progress
//! never has to divide by zero for goals created here.

use crate::{
    core::money,
    entities::{Goal, goal::{self, GoalColor}},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Validated goal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    /// Trimmed title
    pub title: String,
    /// Positive target
    pub target_amount: Decimal,
    /// Saved so far, never negative
    pub current_amount: Decimal,
    /// Optional deadline
    pub deadline: Option<NaiveDate>,
    /// Card colour
    pub color: GoalColor,
}

impl GoalDraft {
    /// Checks the invariants a stored goal must satisfy.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGoal`] for a blank title, a target that is not
    /// positive or a negative current amount.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidGoal {
                reason: "title cannot be empty".to_string(),
            });
        }
        if self.target_amount <= Decimal::ZERO {
            return Err(Error::InvalidGoal {
                reason: format!("target must be positive, got {}", self.target_amount),
            });
        }
        if self.current_amount < Decimal::ZERO {
            return Err(Error::InvalidGoal {
                reason: format!("current amount cannot be negative, got {}", self.current_amount),
            });
        }
        Ok(())
    }
}

/// Raw values from the goal form; amounts are minor-unit digit strings.
#[derive(Debug, Clone, Default)]
pub struct GoalForm {
    /// Title text
    pub title: String,
    /// Target typed as minor units
    pub target_amount: String,
    /// Current savings typed as minor units
    pub current_amount: String,
    /// Deadline as `YYYY-MM-DD`, blank for none
    pub deadline: String,
    /// Selected colour
    pub color: GoalColor,
}

impl GoalForm {
    /// Pre-fills the form from a stored goal for editing.
    #[must_use]
    pub fn from_goal(goal: &goal::Model) -> Self {
        Self {
            title: goal.title.clone(),
            target_amount: goal.target_cents.to_string(),
            current_amount: goal.current_cents.to_string(),
            deadline: goal
                .deadline
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            color: goal.color,
        }
    }

    /// Validates the form and produces a draft.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGoal`] for invalid goal values, or a validation
    /// error for an unparsable deadline.
    pub fn validate(&self) -> Result<GoalDraft> {
        let deadline = match self.deadline.trim() {
            "" => None,
            raw => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                Error::Validation {
                    field: "deadline",
                    reason: e.to_string(),
                }
            })?),
        };

        let draft = GoalDraft {
            title: self.title.trim().to_string(),
            target_amount: money::parse_minor_units(&self.target_amount)?,
            current_amount: money::parse_minor_units(&self.current_amount)?,
            deadline,
            color: self.color,
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// Percent complete, rounded and clamped to `0..=100`.
///
/// A goal at or beyond its target is 100. A non-positive target (only possible
/// for rows created outside this crate) degrades to 0 instead of dividing by zero.
#[must_use]
pub fn progress(goal: &goal::Model) -> u8 {
    progress_of(goal.current_amount(), goal.target_amount())
}

/// Same as [`progress`] for raw amounts.
#[must_use]
pub fn progress_of(current: Decimal, target: Decimal) -> u8 {
    if target <= Decimal::ZERO || current <= Decimal::ZERO {
        return 0;
    }
    if current >= target {
        return 100;
    }
    let percent = (current / target * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    percent.to_u8().map_or(100, |p| p.min(100))
}

/// Amount still missing, never negative.
#[must_use]
pub fn remaining(goal: &goal::Model) -> Decimal {
    (goal.target_amount() - goal.current_amount()).max(Decimal::ZERO)
}

/// Creates a goal for the user.
pub async fn create_goal(
    db: &DatabaseConnection,
    user_id: i64,
    draft: GoalDraft,
) -> Result<goal::Model> {
    draft.validate()?;
    let created = goal::ActiveModel {
        user_id: Set(user_id),
        title: Set(draft.title.trim().to_string()),
        target_cents: Set(money::to_cents(draft.target_amount)?),
        current_cents: Set(money::to_cents(draft.current_amount)?),
        deadline: Set(draft.deadline),
        color: Set(draft.color),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created goal '{}' for user {user_id}", created.title);
    Ok(created)
}

/// Replaces the editable fields of one of the user's goals.
///
/// # Errors
/// Returns [`Error::NotFound`] if the goal does not exist or belongs to another user.
pub async fn update_goal(
    db: &DatabaseConnection,
    user_id: i64,
    goal_id: i64,
    draft: GoalDraft,
) -> Result<goal::Model> {
    draft.validate()?;
    let existing = get_goal_by_id(db, user_id, goal_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "goal",
            id: goal_id,
        })?;

    let mut active: goal::ActiveModel = existing.into();
    active.title = Set(draft.title.trim().to_string());
    active.target_cents = Set(money::to_cents(draft.target_amount)?);
    active.current_cents = Set(money::to_cents(draft.current_amount)?);
    active.deadline = Set(draft.deadline);
    active.color = Set(draft.color);
    let updated = active.update(db).await?;

    info!("Updated goal {goal_id} for user {user_id}");
    Ok(updated)
}

/// Retrieves one of the user's goals.
pub async fn get_goal_by_id(
    db: &DatabaseConnection,
    user_id: i64,
    goal_id: i64,
) -> Result<Option<goal::Model>> {
    Goal::find_by_id(goal_id)
        .filter(goal::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the user's goals, newest first.
pub async fn list_goals(db: &DatabaseConnection, user_id: i64) -> Result<Vec<goal::Model>> {
    Goal::find()
        .filter(goal::Column::UserId.eq(user_id))
        .order_by_desc(goal::Column::CreatedAt)
        .order_by_desc(goal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes one of the user's goals.
///
/// # Errors
/// Returns [`Error::NotFound`] if the goal does not exist or belongs to another user.
pub async fn delete_goal(db: &DatabaseConnection, user_id: i64, goal_id: i64) -> Result<()> {
    let result = Goal::delete_many()
        .filter(goal::Column::Id.eq(goal_id))
        .filter(goal::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "goal",
            id: goal_id,
        });
    }
    info!("Deleted goal {goal_id} for user {user_id}");
    Ok(())
}
