// 🧾 Expense Entity - one payment recorded by a lobby member

use crate::billing::BillingPeriod;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub lobby_id: i64,
    pub spender_telegram_id: i64,
    pub payment_method_id: Option<i64>,

    /// Always > 0
    pub amount: f64,

    pub description: Option<String>,
    pub category: Option<String>,
    pub expense_date: NaiveDateTime,

    /// Snapshot taken at write time; only set for methods with a closing day
    pub billing_period_start: Option<NaiveDateTime>,
    pub billing_period_end: Option<NaiveDateTime>,

    pub created_at: NaiveDateTime,
}

impl Expense {
    pub fn billing_period(&self) -> Option<BillingPeriod> {
        match (self.billing_period_start, self.billing_period_end) {
            (Some(start), Some(end)) => Some(BillingPeriod { start, end }),
            _ => None,
        }
    }

    /// Category with blanks treated as missing.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}
