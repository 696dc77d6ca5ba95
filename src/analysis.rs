// 📈 Spending Analysis - this calendar month vs the previous one
//
// Per-category rules (cur = this month, prev = previous month):
//   new          cur > 0 && prev == 0
//   discontinued cur == 0 && prev > 0
//   spike        change > 20% && prev > 0   (so a brand-new category never spikes)
//
// Uncategorized expenses count toward the overall totals only.

use crate::billing::{month_containing, previous_month_of, BillingPeriod};
use crate::entities::Expense;
use crate::error::Result;
use crate::ledger::expenses_in_range;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Strictly greater than this percentage counts as a spike.
pub const SPIKE_THRESHOLD_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryChange {
    pub name: String,
    pub current_total: f64,
    pub previous_total: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSpike {
    pub category: String,
    pub amount: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub current_period: BillingPeriod,
    pub previous_period: BillingPeriod,
    pub current_total: f64,
    pub previous_total: f64,
    pub change_percent: f64,

    /// Keyed by category name
    pub category_changes: BTreeMap<String, CategoryChange>,

    /// Highest change first, ties by name
    pub spikes: Vec<SpendingSpike>,

    /// Sorted by name
    pub new_categories: Vec<String>,
    pub discontinued_categories: Vec<String>,
}

/// (cur - prev) / prev * 100; 100 for growth from nothing; 0 otherwise.
pub fn change_percent(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    }
}

fn category_totals(expenses: &[Expense]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        if let Some(category) = expense.category_name() {
            *totals.entry(category.to_string()).or_insert(0.0) += expense.amount;
        }
    }
    totals
}

/// Pure comparison of two already-fetched months.
pub fn analyze_expenses(
    current_period: BillingPeriod,
    current: &[Expense],
    previous_period: BillingPeriod,
    previous: &[Expense],
) -> AnalysisResult {
    let current_total: f64 = current.iter().map(|e| e.amount).sum();
    let previous_total: f64 = previous.iter().map(|e| e.amount).sum();

    let current_categories = category_totals(current);
    let previous_categories = category_totals(previous);

    let mut category_changes = BTreeMap::new();
    let mut spikes = Vec::new();
    let mut new_categories = Vec::new();
    let mut discontinued_categories = Vec::new();

    let names = current_categories.keys().chain(previous_categories.keys());
    for name in names {
        if category_changes.contains_key(name) {
            continue;
        }
        let cur = current_categories.get(name).copied().unwrap_or(0.0);
        let prev = previous_categories.get(name).copied().unwrap_or(0.0);
        let change = change_percent(cur, prev);

        if cur > 0.0 && prev == 0.0 {
            new_categories.push(name.clone());
        } else if cur == 0.0 && prev > 0.0 {
            discontinued_categories.push(name.clone());
        }

        if change > SPIKE_THRESHOLD_PERCENT && prev > 0.0 {
            spikes.push(SpendingSpike {
                category: name.clone(),
                amount: cur,
                change_percent: change,
            });
        }

        category_changes.insert(
            name.clone(),
            CategoryChange {
                name: name.clone(),
                current_total: cur,
                previous_total: prev,
                change_percent: change,
            },
        );
    }

    spikes.sort_by(|a, b| {
        b.change_percent
            .partial_cmp(&a.change_percent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    new_categories.sort();
    discontinued_categories.sort();

    AnalysisResult {
        current_period,
        previous_period,
        current_total,
        previous_total,
        change_percent: change_percent(current_total, previous_total),
        category_changes,
        spikes,
        new_categories,
        discontinued_categories,
    }
}

/// Month containing `today` vs the month before it.
pub fn analyze_monthly(
    conn: &Connection,
    lobby_id: i64,
    today: NaiveDate,
) -> Result<AnalysisResult> {
    let current_period = month_containing(today);
    let previous_period = previous_month_of(today);

    let current = expenses_in_range(
        conn,
        lobby_id,
        Some(current_period.start),
        Some(current_period.end),
        None,
    )?;
    let previous = expenses_in_range(
        conn,
        lobby_id,
        Some(previous_period.start),
        Some(previous_period.end),
        None,
    )?;

    Ok(analyze_expenses(current_period, &current, previous_period, &previous))
}

impl AnalysisResult {
    /// Category changes ordered by absolute change, largest first.
    pub fn top_changes(&self, limit: usize) -> Vec<&CategoryChange> {
        let mut changes: Vec<&CategoryChange> = self.category_changes.values().collect();
        changes.sort_by(|a, b| {
            b.change_percent
                .abs()
                .partial_cmp(&a.change_percent.abs())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        changes.truncate(limit);
        changes
    }
}
