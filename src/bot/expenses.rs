// 🧾 Expense commands: /add, /list, /list_billing, /delete, /edit

use super::reports::{billing_cycle, method_label, report_window};
use super::{Context, Reply};
use crate::entities::{Expense, Lobby};
use crate::error::{Entity, LedgerError, Result, ValidationError};
use crate::format::{format_currency, format_date, parse_date};
use crate::ledger::{
    create_expense, delete_expense, expenses_in_billing_period, expenses_in_range,
    get_expense_in_lobby, recent_expenses, update_expense, ExpenseUpdate, NewExpense,
    SpenderChoice,
};
use crate::payment_methods::{find_payment_method_by_name, list_payment_methods};

const RECENT_LIMIT: usize = 10;

/// Numeric spender ids shorter than this are read as categories or names.
const MIN_SPENDER_ID_LEN: usize = 4;

fn parse_amount(input: &str) -> Result<f64> {
    input
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidAmount(input.to_string()).into())
}

/// Trailing spender keyword, if the last argument is one.
fn spender_keyword(arg: &str) -> Option<SpenderChoice> {
    match arg.to_lowercase().as_str() {
        "user1" => Some(SpenderChoice::User1),
        "user2" => Some(SpenderChoice::User2),
        "partner" | "pareja" => Some(SpenderChoice::Partner),
        _ if arg.len() >= MIN_SPENDER_ID_LEN => {
            arg.parse::<i64>().ok().map(SpenderChoice::Explicit)
        }
        _ => None,
    }
}

/// `[category] [payment_method] [spender]` with the spender always last.
fn split_optional<'a>(rest: &[&'a str]) -> (Option<&'a str>, Option<&'a str>, SpenderChoice) {
    let (rest, spender) = match rest.split_last() {
        Some((last, head)) => match spender_keyword(last) {
            Some(choice) => (head, choice),
            None => (rest, SpenderChoice::Issuer),
        },
        None => (rest, SpenderChoice::Issuer),
    };
    (rest.first().copied(), rest.get(1).copied(), spender)
}

fn description_of(ctx: &Context, expense: &Expense) -> String {
    expense
        .description
        .clone()
        .unwrap_or_else(|| ctx.t("expense_no_description"))
}

fn unknown_method_reply(ctx: &Context, lobby: &Lobby, name: &str) -> Result<Reply> {
    let methods = list_payment_methods(ctx.conn, lobby.id, true)?;
    if methods.is_empty() {
        return Ok(ctx.say_with("payment_method_not_found", &[&name]));
    }
    let available = methods
        .iter()
        .map(|method| format!("{} {}", method.method_type.emoji(), method.name))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ctx.say_with("payment_method_not_found_list", &[&name, &available]))
}

// ============================================================================
// /add
// ============================================================================

pub(super) fn add(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    if ctx.args.len() < 2 {
        return Ok(ctx.say("expense_add_usage"));
    }

    let amount = parse_amount(ctx.args[0])?;
    let description = ctx.args[1];
    let (category, method_name, spender) = split_optional(&ctx.args[2..]);

    let method = match method_name {
        Some(name) => match find_payment_method_by_name(ctx.conn, lobby.id, name)? {
            Some(method) => Some(method),
            None => return unknown_method_reply(ctx, &lobby, name),
        },
        None => None,
    };

    let now = ctx.now();
    let expense = create_expense(
        ctx.conn,
        &lobby,
        ctx.user_id,
        NewExpense {
            amount,
            description: Some(description.to_string()),
            category: category.map(String::from),
            expense_date: now,
            payment_method_id: method.as_ref().map(|m| m.id),
            spender,
        },
        now,
    )?;

    let mut msg = ctx.tr(
        "expense_added",
        &[&expense.id, &format_currency(expense.amount), &description_of(ctx, &expense)],
    );
    if let Some(category) = expense.category_name() {
        msg += &ctx.tr("expense_category", &[&category]);
    }
    if let Some(method) = &method {
        msg += &ctx.tr("expense_payment_method", &[&method.name]);
    }
    if expense.spender_telegram_id != ctx.user_id {
        msg += &ctx.tr("expense_spender", &[&ctx.label(expense.spender_telegram_id)]);
    }
    if let Some(period) = expense.billing_period() {
        msg += &ctx.tr(
            "expense_billing_period",
            &[&format_date(period.start), &format_date(period.end)],
        );
    }
    Ok(vec![ctx.reply(msg)])
}

// ============================================================================
// /list, /list_billing
// ============================================================================

pub(super) fn list(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    let window = report_window(ctx, &ctx.args)?;
    let expenses = expenses_in_range(
        ctx.conn,
        lobby.id,
        Some(window.period.start),
        Some(window.period.end),
        None,
    )?;

    if expenses.is_empty() {
        return Ok(ctx.say_with("expense_list_none", &[&window.label]));
    }

    let mut msg = ctx.tr("expense_list_header", &[&window.label]);
    let mut total = 0.0;
    for expense in &expenses {
        total += expense.amount;
        msg += &ctx.tr(
            "expense_list_item",
            &[&expense.id, &format_currency(expense.amount), &description_of(ctx, expense)],
        );
        msg += &ctx.tr("expense_list_spender", &[&ctx.label(expense.spender_telegram_id)]);
        if let Some(category) = expense.category_name() {
            msg += &ctx.tr("expense_list_category", &[&category]);
        }
        if let Some(method_id) = expense.payment_method_id {
            msg += &ctx.tr("expense_list_payment_method", &[&method_label(ctx, method_id)]);
        }
        msg += &ctx.tr("expense_list_date", &[&format_date(expense.expense_date)]);
    }
    msg += &ctx.tr("expense_list_total", &[&format_currency(total)]);

    Ok(vec![ctx.reply(msg)])
}

pub(super) fn list_billing(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    let Some(name) = ctx.arg(0) else {
        return Ok(ctx.say("expense_billing_usage"));
    };

    let (method, period) = billing_cycle(ctx, &lobby, name, ctx.arg(1))?;
    let expenses = expenses_in_billing_period(ctx.conn, lobby.id, method.id, period)?;
    let start = format_date(period.start);
    let end = format_date(period.end);

    if expenses.is_empty() {
        return Ok(ctx.say_with("expense_billing_none", &[&start, &end]));
    }

    let mut msg = ctx.tr("expense_billing_header", &[&method.name, &start, &end]);
    let mut total = 0.0;
    for expense in &expenses {
        total += expense.amount;
        msg += &ctx.tr(
            "expense_billing_item",
            &[
                &expense.id,
                &format_currency(expense.amount),
                &description_of(ctx, expense),
                &format_date(expense.expense_date),
            ],
        );
    }
    msg += "\n";
    msg += &ctx.tr("expense_list_total", &[&format_currency(total)]);

    Ok(vec![ctx.reply(msg)])
}

// ============================================================================
// /delete, /edit
// ============================================================================

pub(super) fn delete(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;

    let Some(raw_id) = ctx.arg(0) else {
        let recent = recent_expenses(ctx.conn, lobby.id, RECENT_LIMIT)?;
        if recent.is_empty() {
            return Ok(ctx.say("expense_delete_none"));
        }
        let mut msg = ctx.t("expense_delete_list_header");
        for expense in &recent {
            msg += &ctx.tr(
                "expense_list_item",
                &[&expense.id, &format_currency(expense.amount), &description_of(ctx, expense)],
            );
            msg += &ctx.tr("expense_list_date", &[&format_date(expense.expense_date)]);
        }
        msg += &ctx.t("expense_delete_hint");
        return Ok(vec![ctx.reply(msg)]);
    };

    let Ok(id) = raw_id.parse::<i64>() else {
        return Ok(ctx.say("expense_delete_invalid_id"));
    };

    get_expense_in_lobby(ctx.conn, lobby.id, id)?;
    delete_expense(ctx.conn, id)?;
    Ok(ctx.say("expense_deleted"))
}

pub(super) fn edit(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    if ctx.args.len() < 3 {
        return Ok(ctx.say("expense_edit_usage"));
    }
    let Ok(id) = ctx.args[0].parse::<i64>() else {
        return Ok(ctx.say("expense_edit_invalid_id"));
    };

    let existing = get_expense_in_lobby(ctx.conn, lobby.id, id)?;
    let value = ctx.args[2..].join(" ");

    let update = match ctx.args[1].to_lowercase().as_str() {
        "amount" | "monto" => ExpenseUpdate {
            amount: Some(parse_amount(&value)?),
            ..Default::default()
        },
        "description" | "descripcion" => ExpenseUpdate {
            description: Some(value),
            ..Default::default()
        },
        "category" | "categoria" => ExpenseUpdate {
            category: Some(value),
            ..Default::default()
        },
        "date" | "fecha" => ExpenseUpdate {
            expense_date: Some(parse_date(&value)?.and_time(existing.expense_date.time())),
            ..Default::default()
        },
        "payment_method" | "payment" | "metodo_pago" => {
            let method = find_payment_method_by_name(ctx.conn, lobby.id, &value)?
                .ok_or_else(|| LedgerError::not_found(Entity::PaymentMethod, &value))?;
            ExpenseUpdate {
                payment_method_id: Some(method.id),
                ..Default::default()
            }
        }
        _ => return Ok(ctx.say("expense_edit_invalid_field")),
    };

    let updated = update_expense(ctx.conn, id, update)?;
    let mut msg = ctx.t("expense_edited");
    msg += "\n\n";
    msg += &ctx.tr(
        "expense_list_item",
        &[&updated.id, &format_currency(updated.amount), &description_of(ctx, &updated)],
    );
    if let Some(category) = updated.category_name() {
        msg += &ctx.tr("expense_list_category", &[&category]);
    }
    if let Some(period) = updated.billing_period() {
        msg += &ctx.tr(
            "expense_billing_period",
            &[&format_date(period.start), &format_date(period.end)],
        );
    }
    Ok(vec![ctx.reply(msg)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spender_keywords() {
        assert_eq!(spender_keyword("Pareja"), Some(SpenderChoice::Partner));
        assert_eq!(spender_keyword("user1"), Some(SpenderChoice::User1));
        assert_eq!(spender_keyword("123456789"), Some(SpenderChoice::Explicit(123456789)));
        assert_eq!(spender_keyword("123"), None);
        assert_eq!(spender_keyword("Food"), None);
    }

    #[test]
    fn test_split_optional_arguments() {
        assert_eq!(split_optional(&[]), (None, None, SpenderChoice::Issuer));
        assert_eq!(
            split_optional(&["Food", "Visa", "partner"]),
            (Some("Food"), Some("Visa"), SpenderChoice::Partner)
        );
        assert_eq!(
            split_optional(&["Food", "user2"]),
            (Some("Food"), None, SpenderChoice::User2)
        );
        assert_eq!(
            split_optional(&["Food", "Visa"]),
            (Some("Food"), Some("Visa"), SpenderChoice::Issuer)
        );
    }
}
