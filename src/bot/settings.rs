// ⚙️ Configuration commands: /settings, /payment_methods

use super::{Context, Reply};
use crate::entities::{AccountType, Lobby, PaymentMethod, PaymentMethodType};
use crate::error::{Result, ValidationError};
use crate::format::format_percent;
use crate::ledger::{resolve_spender, SpenderChoice};
use crate::lobbies::{update_settings, LobbySettingsUpdate};
use crate::payment_methods::{
    create_payment_method, deactivate_payment_method, get_payment_method_in_lobby,
    list_payment_methods, update_payment_method, NewPaymentMethod, PaymentMethodUpdate,
};

// ============================================================================
// /settings
// ============================================================================

pub(super) fn settings(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;

    let Some(setting) = ctx.arg(0) else {
        return Ok(ctx.say_with(
            "settings_current",
            &[
                &lobby.id,
                &lobby.account_type,
                &format_percent(lobby.user1_salary_percentage),
                &format_percent(lobby.user2_salary_percentage),
            ],
        ));
    };

    let update = match setting.to_lowercase().as_str() {
        "account_type" | "accounttype" => {
            let Some(value) = ctx.arg(1) else {
                return Ok(ctx.say("settings_usage"));
            };
            LobbySettingsUpdate {
                account_type: Some(value.parse::<AccountType>()?),
                ..Default::default()
            }
        }
        "salary" => {
            let (Some(first), Some(second)) = (ctx.arg(1), ctx.arg(2)) else {
                return Ok(ctx.say("settings_salary_usage"));
            };
            let (Ok(first), Ok(second)) = (first.parse::<f64>(), second.parse::<f64>()) else {
                return Ok(ctx.say("settings_invalid_pct"));
            };
            LobbySettingsUpdate {
                user1_salary_percentage: Some(first),
                user2_salary_percentage: Some(second),
                ..Default::default()
            }
        }
        _ => return Ok(ctx.say("settings_unknown")),
    };

    update_settings(ctx.conn, lobby.id, update)?;
    Ok(ctx.say("settings_updated"))
}

// ============================================================================
// /payment_methods
// ============================================================================

fn method_line(ctx: &Context, method: &PaymentMethod) -> String {
    let status = if method.is_active { "✅" } else { "❌" };
    let mut line = ctx.tr(
        "payment_method_item",
        &[
            &format!("{}{}", status, method.method_type.emoji()),
            &method.id,
            &method.name,
            &method.method_type,
        ],
    );
    if let Some(closing_day) = method.closing_day {
        line += &ctx.tr("payment_method_closing", &[&closing_day.get()]);
    }
    if let Some(owner) = method.owner_telegram_id {
        line += &ctx.tr("payment_method_owner", &[&ctx.label(owner)]);
    }
    line
}

fn list_methods(ctx: &Context, lobby: &Lobby) -> Result<Reply> {
    let methods = list_payment_methods(ctx.conn, lobby.id, false)?;
    if methods.is_empty() {
        return Ok(ctx.say("payment_methods_none"));
    }
    let lines = methods
        .iter()
        .map(|method| method_line(ctx, method))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ctx.say_with("payment_methods_list", &[&lines]))
}

fn parse_closing_day(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| ValidationError::InvalidClosingDay(0).into())
}

/// `me`, `user1`, `user2`, `partner`/`pareja` or a member id.
fn parse_owner(ctx: &Context, lobby: &Lobby, raw: &str) -> Result<i64> {
    let choice = match raw.to_lowercase().as_str() {
        "me" | "yo" => SpenderChoice::Issuer,
        "user1" => SpenderChoice::User1,
        "user2" => SpenderChoice::User2,
        "partner" | "pareja" => SpenderChoice::Partner,
        _ => SpenderChoice::Explicit(
            raw.parse::<i64>()
                .map_err(|_| ValidationError::UnknownSpender(raw.to_string()))?,
        ),
    };
    resolve_spender(lobby, ctx.user_id, choice)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "si" | "sí" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn add_method(ctx: &Context, lobby: &Lobby, args: &[&str]) -> Result<Reply> {
    let [name, kind, rest @ ..] = args else {
        return Ok(ctx.say("payment_method_add_usage"));
    };

    let method_type = kind.parse::<PaymentMethodType>()?;
    let closing_day = rest.first().map(|raw| parse_closing_day(raw)).transpose()?;

    let method = create_payment_method(
        ctx.conn,
        lobby.id,
        NewPaymentMethod {
            name: name.to_string(),
            method_type,
            owner_telegram_id: None,
            closing_day,
        },
        ctx.now(),
    )?;

    let mut msg = ctx.tr("payment_method_added", &[&method.name, &method.id]);
    if let Some(closing_day) = method.closing_day {
        msg += &ctx.tr("payment_method_closing_day", &[&closing_day.get()]);
    }
    Ok(vec![ctx.reply(msg)])
}

fn edit_method(ctx: &Context, lobby: &Lobby, args: &[&str]) -> Result<Reply> {
    let [raw_id, field, value @ ..] = args else {
        return Ok(ctx.say("payment_method_edit_usage"));
    };
    let Ok(id) = raw_id.parse::<i64>() else {
        return Ok(ctx.say("payment_method_invalid_id"));
    };
    if value.is_empty() {
        return Ok(ctx.say("payment_method_edit_usage"));
    }
    let value = value.join(" ");

    get_payment_method_in_lobby(ctx.conn, lobby.id, id)?;

    let update = match field.to_lowercase().as_str() {
        "name" => PaymentMethodUpdate {
            name: Some(value),
            ..Default::default()
        },
        "type" => PaymentMethodUpdate {
            method_type: Some(value.parse::<PaymentMethodType>()?),
            ..Default::default()
        },
        "closing_day" => PaymentMethodUpdate {
            closing_day: Some(parse_closing_day(&value)?),
            ..Default::default()
        },
        "owner" => PaymentMethodUpdate {
            owner_telegram_id: Some(parse_owner(ctx, lobby, &value)?),
            ..Default::default()
        },
        "active" => match parse_flag(&value) {
            Some(flag) => PaymentMethodUpdate {
                is_active: Some(flag),
                ..Default::default()
            },
            None => return Ok(ctx.say("payment_method_edit_usage")),
        },
        _ => return Ok(ctx.say("payment_method_edit_usage")),
    };

    let method = update_payment_method(ctx.conn, id, update)?;
    Ok(vec![ctx.reply(format!(
        "{}\n\n{}",
        ctx.t("payment_method_updated"),
        method_line(ctx, &method)
    ))])
}

fn delete_method(ctx: &Context, lobby: &Lobby, args: &[&str]) -> Result<Reply> {
    let Some(raw_id) = args.first() else {
        return Ok(ctx.say("payment_method_delete_usage"));
    };
    let Ok(id) = raw_id.parse::<i64>() else {
        return Ok(ctx.say("payment_method_invalid_id"));
    };

    get_payment_method_in_lobby(ctx.conn, lobby.id, id)?;
    deactivate_payment_method(ctx.conn, id)?;
    Ok(ctx.say("payment_method_deleted"))
}

pub(super) fn payment_methods(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;

    let Some(action) = ctx.arg(0) else {
        return list_methods(ctx, &lobby);
    };
    let rest = &ctx.args[1..];

    match action.to_lowercase().as_str() {
        "add" => add_method(ctx, &lobby, rest),
        "edit" | "update" => edit_method(ctx, &lobby, rest),
        "delete" | "remove" => delete_method(ctx, &lobby, rest),
        "list" => list_methods(ctx, &lobby),
        _ => Ok(ctx.say("payment_method_unknown_action")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("Sí"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_non_numeric_closing_day_is_invalid() {
        assert!(matches!(
            parse_closing_day("fifteen"),
            Err(crate::error::LedgerError::Validation(ValidationError::InvalidClosingDay(_)))
        ));
        assert_eq!(parse_closing_day("15").unwrap(), 15);
    }
}
