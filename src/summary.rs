// 📊 Spending Summary - per person, per category, per payment method

use crate::entities::{Expense, Lobby};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodTotal {
    pub payment_method_id: i64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub lobby_id: i64,
    pub total: f64,
    pub count: usize,
    pub user1_total: f64,
    pub user2_total: f64,

    /// Largest first
    pub by_category: Vec<CategoryTotal>,
    /// Largest first; expenses without a method are left out
    pub by_payment_method: Vec<PaymentMethodTotal>,
}

impl SpendingSummary {
    /// Share of the total in percent (0 when there is nothing to share).
    pub fn percent_of_total(&self, amount: f64) -> f64 {
        if self.total > 0.0 {
            amount / self.total * 100.0
        } else {
            0.0
        }
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn summarize(lobby: &Lobby, expenses: &[Expense]) -> SpendingSummary {
    let mut total = 0.0;
    let mut user1_total = 0.0;
    let mut user2_total = 0.0;
    let mut categories: HashMap<&str, f64> = HashMap::new();
    let mut methods: HashMap<i64, f64> = HashMap::new();

    for expense in expenses {
        total += expense.amount;
        if expense.spender_telegram_id == lobby.user1_telegram_id {
            user1_total += expense.amount;
        } else if Some(expense.spender_telegram_id) == lobby.user2_telegram_id {
            user2_total += expense.amount;
        }
        if let Some(category) = expense.category_name() {
            *categories.entry(category).or_insert(0.0) += expense.amount;
        }
        if let Some(method_id) = expense.payment_method_id {
            *methods.entry(method_id).or_insert(0.0) += expense.amount;
        }
    }

    let mut by_category: Vec<CategoryTotal> = categories
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect();
    by_category.sort_by(|a, b| {
        descending(a.total, b.total).then_with(|| a.category.cmp(&b.category))
    });

    let mut by_payment_method: Vec<PaymentMethodTotal> = methods
        .into_iter()
        .map(|(payment_method_id, total)| PaymentMethodTotal {
            payment_method_id,
            total,
        })
        .collect();
    by_payment_method.sort_by(|a, b| {
        descending(a.total, b.total).then_with(|| a.payment_method_id.cmp(&b.payment_method_id))
    });

    SpendingSummary {
        lobby_id: lobby.id,
        total,
        count: expenses.len(),
        user1_total,
        user2_total,
        by_category,
        by_payment_method,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::AccountType;
    use chrono::NaiveDate;

    fn lobby() -> Lobby {
        Lobby {
            id: 3,
            user1_telegram_id: 1,
            user2_telegram_id: Some(2),
            account_type: AccountType::Separate,
            user1_salary_percentage: 0.5,
            user2_salary_percentage: 0.5,
            invite_token: None,
            group_chat_id: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn spent(spender: i64, amount: f64, category: Option<&str>, method: Option<i64>) -> Expense {
        let at = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Expense {
            id: 0,
            lobby_id: 3,
            spender_telegram_id: spender,
            payment_method_id: method,
            amount,
            description: None,
            category: category.map(String::from),
            expense_date: at,
            billing_period_start: None,
            billing_period_end: None,
            created_at: at,
        }
    }

    #[test]
    fn test_summary_breakdowns() {
        let summary = summarize(
            &lobby(),
            &[
                spent(1, 30.0, Some("Food"), Some(7)),
                spent(2, 50.0, Some("Rent"), None),
                spent(1, 20.0, Some("Food"), Some(8)),
                spent(2, 10.0, None, Some(8)),
            ],
        );

        assert_eq!(summary.total, 110.0);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.user1_total, 50.0);
        assert_eq!(summary.user2_total, 60.0);

        assert_eq!(summary.by_category[0].category, "Food");
        assert_eq!(summary.by_category[0].total, 50.0);
        assert_eq!(summary.by_category[1].category, "Rent");
        assert_eq!(summary.by_category.len(), 2);

        assert_eq!(summary.by_payment_method[0].payment_method_id, 7);
        assert_eq!(summary.by_payment_method[1].total, 30.0);
    }

    #[test]
    fn test_percent_of_empty_total() {
        let summary = summarize(&lobby(), &[]);
        assert_eq!(summary.percent_of_total(10.0), 0.0);
        assert!(summary.by_category.is_empty());
    }
}
