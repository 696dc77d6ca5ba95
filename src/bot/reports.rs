// 📊 Report commands: /summary, /summary_billing, /settle, /settle_billing, /analyze
//
// Window arguments shared with /list:
//   (none)            current calendar month
//   <month>           that calendar month (YYYY-MM, YYYY/MM, MM/YYYY)
//   <start> <end>     inclusive date range
//
// Billing variants take `<payment_method> [month]` and use the method's
// canonical statement period for that month.

use super::{Context, Reply};
use crate::analysis::{analyze_monthly, AnalysisResult};
use crate::billing::{end_of_day, month_bounds, period_for_month, start_of_day, BillingPeriod};
use crate::entities::{AccountType, Expense, Lobby, PaymentMethod};
use crate::error::{Entity, LedgerError, Result, ValidationError};
use crate::format::{
    format_currency, format_date, format_month, format_percent, parse_date, parse_month,
};
use crate::ledger::{expenses_in_billing_period, expenses_in_range};
use crate::payment_methods::{find_payment_method, find_payment_method_by_name};
use crate::settlement::{settle_billing_cycle, settle_range, Direction, SettlementResult};
use crate::summary::{summarize, SpendingSummary};
use chrono::Datelike;

const TOP_CHANGES: usize = 5;

// ============================================================================
// WINDOWS
// ============================================================================

/// A period plus the text used to name it in replies.
pub(super) struct Window {
    pub period: BillingPeriod,
    pub label: String,
}

pub(super) fn report_window(ctx: &Context, args: &[&str]) -> Result<Window> {
    match args {
        [] => {
            let today = ctx.today();
            Ok(Window {
                period: month_bounds(today.year(), today.month())?,
                label: format_month(today.year(), today.month()),
            })
        }
        [month] => {
            let (year, month) = parse_month(month)?;
            Ok(Window {
                period: month_bounds(year, month)?,
                label: format_month(year, month),
            })
        }
        [start, end, ..] => {
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            if start > end {
                return Err(ValidationError::InvalidPeriod(format!("{} > {}", start, end)).into());
            }
            let period = BillingPeriod {
                start: start_of_day(start),
                end: end_of_day(end),
            };
            Ok(Window {
                label: range_label(ctx, &period),
                period,
            })
        }
    }
}

pub(super) fn range_label(ctx: &Context, period: &BillingPeriod) -> String {
    ctx.tr(
        "period_range",
        &[&format_date(period.start), &format_date(period.end)],
    )
}

/// Active method by name and its statement period for `month` (default: the
/// current month).
pub(super) fn billing_cycle(
    ctx: &Context,
    lobby: &Lobby,
    name: &str,
    month: Option<&str>,
) -> Result<(PaymentMethod, BillingPeriod)> {
    let method = find_payment_method_by_name(ctx.conn, lobby.id, name)?
        .ok_or_else(|| LedgerError::not_found(Entity::PaymentMethod, name))?;
    let closing_day = method
        .closing_day
        .ok_or_else(|| ValidationError::NoBillingCycle(method.name.clone()))?;

    let (year, month) = match month {
        Some(month) => parse_month(month)?,
        None => {
            let today = ctx.today();
            (today.year(), today.month())
        }
    };
    let period = period_for_month(year, month, closing_day)?;
    Ok((method, period))
}

/// Payment method name for display; unknown ids fall back to `#id`.
pub(super) fn method_label(ctx: &Context, payment_method_id: i64) -> String {
    match find_payment_method(ctx.conn, payment_method_id) {
        Ok(Some(method)) => method.name,
        _ => format!("#{}", payment_method_id),
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

fn render_summary(ctx: &Context, lobby: &Lobby, summary: &SpendingSummary, label: &str) -> String {
    let percent = |amount: f64| format!("{:.1}%", summary.percent_of_total(amount));

    let mut msg = ctx.tr(
        "summary_header",
        &[&label, &format_currency(summary.total), &summary.count],
    );

    msg += &ctx.t("summary_by_person");
    msg += &ctx.tr(
        "summary_person_item",
        &[
            &ctx.label(lobby.user1_telegram_id),
            &format_currency(summary.user1_total),
            &percent(summary.user1_total),
        ],
    );
    if let Some(user2) = lobby.user2_telegram_id {
        msg += &ctx.tr(
            "summary_person_item",
            &[
                &ctx.label(user2),
                &format_currency(summary.user2_total),
                &percent(summary.user2_total),
            ],
        );
    }

    if !summary.by_category.is_empty() {
        msg += "\n";
        msg += &ctx.t("summary_by_category");
        for entry in &summary.by_category {
            msg += &ctx.tr(
                "summary_category_item",
                &[&entry.category, &format_currency(entry.total), &percent(entry.total)],
            );
        }
    }

    if !summary.by_payment_method.is_empty() {
        msg += "\n";
        msg += &ctx.t("summary_by_payment");
        for entry in &summary.by_payment_method {
            msg += &ctx.tr(
                "summary_category_item",
                &[
                    &method_label(ctx, entry.payment_method_id),
                    &format_currency(entry.total),
                    &percent(entry.total),
                ],
            );
        }
    }

    msg
}

fn summary_reply(ctx: &Context, lobby: &Lobby, expenses: &[Expense], label: &str) -> Reply {
    if expenses.is_empty() {
        return ctx.say_with("summary_none", &[&label]);
    }
    let summary = summarize(lobby, expenses);
    vec![ctx.reply(render_summary(ctx, lobby, &summary, label))]
}

pub(super) fn summary(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    let window = report_window(ctx, &ctx.args)?;
    let expenses = expenses_in_range(
        ctx.conn,
        lobby.id,
        Some(window.period.start),
        Some(window.period.end),
        None,
    )?;
    Ok(summary_reply(ctx, &lobby, &expenses, &window.label))
}

pub(super) fn summary_billing(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    let Some(name) = ctx.arg(0) else {
        return Ok(ctx.say("summary_billing_usage"));
    };

    let (method, period) = billing_cycle(ctx, &lobby, name, ctx.arg(1))?;
    let expenses = expenses_in_billing_period(ctx.conn, lobby.id, method.id, period)?;
    let label = format!("{} ({})", range_label(ctx, &period), method.name);
    Ok(summary_reply(ctx, &lobby, &expenses, &label))
}

// ============================================================================
// SETTLEMENT
// ============================================================================

fn direction_line(ctx: &Context, direction: Direction) -> String {
    match direction {
        Direction::User1OwesUser2(amount) => {
            ctx.tr("settle_user1_owes", &[&format_currency(amount)])
        }
        Direction::User2OwesUser1(amount) => {
            ctx.tr("settle_user2_owes", &[&format_currency(amount)])
        }
        Direction::Settled => ctx.t("settle_all_settled"),
    }
}

pub(super) fn render_settlement(ctx: &Context, result: &SettlementResult, label: &str) -> String {
    let mut msg = ctx.tr(
        "settle_report",
        &[&label, &result.account_type, &format_currency(result.total)],
    );

    match result.account_type {
        AccountType::Separate => {
            msg += &ctx.t("settle_separate");
            msg += &ctx.tr("settle_user1_spent", &[&format_currency(result.user1_spent)]);
            msg += &ctx.tr("settle_user2_spent", &[&format_currency(result.user2_spent)]);
            msg += &ctx.tr("settle_expected_per", &[&format_currency(result.user1_expected)]);
        }
        AccountType::Shared => {
            msg += &ctx.t("settle_shared");
            msg += &ctx.tr("settle_user1_spent", &[&format_currency(result.user1_spent)]);
            msg += &ctx.tr("settle_user2_spent", &[&format_currency(result.user2_spent)]);
            msg += &ctx.tr(
                "settle_user1_expected",
                &[
                    &format_percent(result.user1_salary_percentage),
                    &format_currency(result.user1_expected),
                ],
            );
            msg += &ctx.tr(
                "settle_user2_expected",
                &[
                    &format_percent(result.user2_salary_percentage),
                    &format_currency(result.user2_expected),
                ],
            );
        }
    }

    // Participant 2's line is printed only when it reads differently from
    // participant 1's; the two debts disagree only when someone outside the
    // lobby paid.
    let first = direction_line(ctx, result.user1_direction());
    let second = direction_line(ctx, result.user2_direction());
    msg += &first;
    if second != first {
        msg += &second;
    }
    msg
}

pub(super) fn settle(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    let window = report_window(ctx, &ctx.args)?;
    let result = settle_range(
        ctx.conn,
        &lobby,
        Some(window.period.start),
        Some(window.period.end),
    )?;
    Ok(vec![ctx.reply(render_settlement(ctx, &result, &window.label))])
}

pub(super) fn settle_billing(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    let Some(name) = ctx.arg(0) else {
        return Ok(ctx.say("settle_usage"));
    };

    let (method, period) = billing_cycle(ctx, &lobby, name, ctx.arg(1))?;
    let result = settle_billing_cycle(ctx.conn, &lobby, method.id, period)?;
    let label = format!("{} ({})", range_label(ctx, &period), method.name);
    Ok(vec![ctx.reply(render_settlement(ctx, &result, &label))])
}

// ============================================================================
// ANALYSIS
// ============================================================================

fn period_month(period: &BillingPeriod) -> String {
    format_month(period.start.year(), period.start.month())
}

pub(super) fn render_analysis(ctx: &Context, result: &AnalysisResult) -> String {
    let mut msg = ctx.tr(
        "analyze_header",
        &[&period_month(&result.current_period), &period_month(&result.previous_period)],
    );

    msg += &ctx.t("analyze_overall");
    msg += &ctx.tr("analyze_current", &[&format_currency(result.current_total)]);
    msg += &ctx.tr("analyze_previous", &[&format_currency(result.previous_total)]);
    if result.change_percent > 0.0 {
        msg += &ctx.tr("analyze_increase", &[&format!("{:.1}%", result.change_percent)]);
    } else if result.change_percent < 0.0 {
        msg += &ctx.tr("analyze_decrease", &[&format!("{:.1}%", -result.change_percent)]);
    } else {
        msg += &ctx.t("analyze_no_change");
    }

    if !result.spikes.is_empty() {
        msg += &ctx.t("analyze_spikes");
        for spike in &result.spikes {
            msg += &ctx.tr(
                "analyze_spike_item",
                &[
                    &spike.category,
                    &format_currency(spike.amount),
                    &format!("{:.1}%", spike.change_percent),
                ],
            );
        }
        msg += "\n";
    }

    if !result.new_categories.is_empty() {
        msg += &ctx.t("analyze_new_categories");
        for category in &result.new_categories {
            msg += &ctx.tr("analyze_new_category", &[category]);
        }
        msg += "\n";
    }

    if !result.discontinued_categories.is_empty() {
        msg += &ctx.t("analyze_discontinued");
        for category in &result.discontinued_categories {
            msg += &ctx.tr("analyze_new_category", &[category]);
        }
        msg += "\n";
    }

    let changes: Vec<_> = result
        .top_changes(usize::MAX)
        .into_iter()
        .filter(|change| change.previous_total > 0.0)
        .take(TOP_CHANGES)
        .collect();
    if !changes.is_empty() {
        msg += &ctx.t("analyze_top_changes");
        for change in changes {
            msg += &ctx.tr(
                "analyze_change_item",
                &[
                    &change.name,
                    &format_currency(change.previous_total),
                    &format_currency(change.current_total),
                    &format!("{:+.1}%", change.change_percent),
                ],
            );
        }
    }

    msg
}

pub(super) fn analyze(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    let result = analyze_monthly(ctx.conn, lobby.id, ctx.today())?;
    Ok(vec![ctx.reply(render_analysis(ctx, &result))])
}
