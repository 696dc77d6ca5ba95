// ⚖️ Settlement Engine - who owes whom over a set of expenses
//
// Following the formula:
//   separate: expected1 = expected2 = total / 2
//   shared:   expected1 = total * share1, expected2 = total * share2
//   debt_n   = expected_n - spent_n
//
// Positive debt = that participant owes the other. The two debts are computed
// independently: an expense paid by someone outside the lobby counts toward
// `total` but toward neither `spent`, so debt1 + debt2 != 0 in that case.

use crate::billing::BillingPeriod;
use crate::entities::{AccountType, Expense, Lobby};
use crate::error::Result;
use crate::ledger::{expenses_in_billing_period, expenses_in_range};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Debts that round to 0.00 are shown as settled.
pub const SETTLED_TOLERANCE: f64 = 0.005;

// ============================================================================
// SETTLEMENT RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub lobby_id: i64,
    pub account_type: AccountType,

    /// Window the expenses were selected from (None = unbounded side)
    pub period_start: Option<NaiveDateTime>,
    pub period_end: Option<NaiveDateTime>,

    pub user1_id: i64,
    pub user2_id: Option<i64>,
    pub user1_salary_percentage: f64,
    pub user2_salary_percentage: f64,

    pub total: f64,
    pub expense_count: usize,
    pub user1_spent: f64,
    pub user2_spent: f64,
    pub user1_expected: f64,
    pub user2_expected: f64,

    /// Positive = user 1 owes user 2
    pub user1_debt: f64,
    /// Positive = user 2 owes user 1
    pub user2_debt: f64,
}

/// Payment direction implied by one debt figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    User1OwesUser2(f64),
    User2OwesUser1(f64),
    Settled,
}

impl Direction {
    /// Reading of `user1_debt`.
    pub fn from_user1_debt(debt: f64) -> Self {
        if debt.abs() < SETTLED_TOLERANCE {
            Direction::Settled
        } else if debt > 0.0 {
            Direction::User1OwesUser2(debt)
        } else {
            Direction::User2OwesUser1(-debt)
        }
    }

    /// Reading of `user2_debt`.
    pub fn from_user2_debt(debt: f64) -> Self {
        if debt.abs() < SETTLED_TOLERANCE {
            Direction::Settled
        } else if debt > 0.0 {
            Direction::User2OwesUser1(debt)
        } else {
            Direction::User1OwesUser2(-debt)
        }
    }
}

impl SettlementResult {
    pub fn user1_direction(&self) -> Direction {
        Direction::from_user1_debt(self.user1_debt)
    }

    pub fn user2_direction(&self) -> Direction {
        Direction::from_user2_debt(self.user2_debt)
    }

    /// True when the two debts mirror each other (every spender was a member).
    pub fn is_balanced(&self) -> bool {
        (self.user1_debt + self.user2_debt).abs() < SETTLED_TOLERANCE
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Pure computation over an already-selected expense set.
pub fn compute_settlement(
    lobby: &Lobby,
    expenses: &[Expense],
    period_start: Option<NaiveDateTime>,
    period_end: Option<NaiveDateTime>,
) -> SettlementResult {
    let mut total = 0.0;
    let mut user1_spent = 0.0;
    let mut user2_spent = 0.0;

    for expense in expenses {
        total += expense.amount;
        if expense.spender_telegram_id == lobby.user1_telegram_id {
            user1_spent += expense.amount;
        } else if Some(expense.spender_telegram_id) == lobby.user2_telegram_id {
            user2_spent += expense.amount;
        }
    }

    let (user1_expected, user2_expected) = match lobby.account_type {
        AccountType::Separate => (total / 2.0, total / 2.0),
        AccountType::Shared => (
            total * lobby.user1_salary_percentage,
            total * lobby.user2_salary_percentage,
        ),
    };

    SettlementResult {
        lobby_id: lobby.id,
        account_type: lobby.account_type,
        period_start,
        period_end,
        user1_id: lobby.user1_telegram_id,
        user2_id: lobby.user2_telegram_id,
        user1_salary_percentage: lobby.user1_salary_percentage,
        user2_salary_percentage: lobby.user2_salary_percentage,
        total,
        expense_count: expenses.len(),
        user1_spent,
        user2_spent,
        user1_expected,
        user2_expected,
        user1_debt: user1_expected - user1_spent,
        user2_debt: user2_expected - user2_spent,
    }
}

/// Settlement over expenses dated inside `[start, end]`.
pub fn settle_range(
    conn: &Connection,
    lobby: &Lobby,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<SettlementResult> {
    let expenses = expenses_in_range(conn, lobby.id, start, end, None)?;
    let result = compute_settlement(lobby, &expenses, start, end);
    debug!(lobby_id = lobby.id, total = result.total, "range settlement");
    Ok(result)
}

/// Settlement over one payment method's statement cycle.
pub fn settle_billing_cycle(
    conn: &Connection,
    lobby: &Lobby,
    payment_method_id: i64,
    period: BillingPeriod,
) -> Result<SettlementResult> {
    let expenses = expenses_in_billing_period(conn, lobby.id, payment_method_id, period)?;
    let result = compute_settlement(lobby, &expenses, Some(period.start), Some(period.end));
    debug!(lobby_id = lobby.id, payment_method_id, total = result.total, "cycle settlement");
    Ok(result)
}
