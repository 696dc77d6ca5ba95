// 💑 Session commands: /start, /help, /language, /invite, /regenerate_invite
//
// /start resolution order:
//   1. already a member in this chat      -> welcome back
//   2. group chat with an existing lobby  -> take the free seat
//   3. invitation token supplied          -> join by token
//   4. brand-new user in a private chat   -> ask for a language first
//   5. otherwise                          -> create a lobby

use super::{Context, OutboundMessage, Reply, ReplyOption};
use crate::entities::{AccountType, ChatScope, Language, Lobby};
use crate::error::{Entity, LedgerError, Result};
use crate::lobbies::{
    create_lobby, find_lobby_by_group, find_lobby_for_member, join_by_token, join_directly,
    regenerate_token,
};
use crate::token;
use crate::users::set_language;
use tracing::info;

fn partner_line(ctx: &Context, lobby: &Lobby) -> String {
    match lobby.partner_of(ctx.user_id) {
        Some(partner) => ctx.tr("partner_line", &[&ctx.label(partner)]),
        None => ctx.t("waiting_partner"),
    }
}

fn welcome_back(ctx: &Context, lobby: &Lobby) -> Reply {
    ctx.say_with(
        "welcome_back",
        &[
            &ctx.own_label(),
            &lobby.id,
            &lobby.account_type,
            &partner_line(ctx, lobby),
        ],
    )
}

fn create_and_welcome(ctx: &Context) -> Result<Reply> {
    let lobby = create_lobby(
        ctx.conn,
        ctx.user_id,
        AccountType::Separate,
        ctx.scope,
        ctx.now(),
    )?;
    let name = ctx.own_label();

    if ctx.scope.is_group() {
        return Ok(ctx.say_with(
            "lobby_created_group",
            &[&name, &lobby.id, &lobby.account_type],
        ));
    }

    let invite = token::format_for_display(lobby.invite_token.as_deref().unwrap_or_default());
    Ok(vec![
        ctx.reply(ctx.tr(
            "lobby_created",
            &[&name, &lobby.id, &lobby.account_type, &invite],
        )),
        ctx.reply(ctx.tr("lobby_security_info", &[&invite])),
    ])
}

fn language_prompt(ctx: &Context) -> OutboundMessage {
    let options = Language::ALL
        .iter()
        .map(|language| {
            let flag = match language {
                Language::English => "🇬🇧",
                Language::SpanishArgentina => "🇦🇷",
            };
            ReplyOption {
                label: format!("{} {}", flag, language.native_name()),
                payload: format!("lang_{}", language.as_str()),
            }
        })
        .collect();

    OutboundMessage {
        options,
        ..ctx.reply(ctx.t("language_prompt"))
    }
}

pub(super) fn start(ctx: &Context) -> Result<Reply> {
    if let Some(lobby) = find_lobby_for_member(ctx.conn, ctx.user_id, ctx.scope)? {
        return Ok(welcome_back(ctx, &lobby));
    }

    if let ChatScope::Group(chat_id) = ctx.scope {
        if let Some(existing) = find_lobby_by_group(ctx.conn, chat_id)? {
            let lobby = join_directly(ctx.conn, existing.id, ctx.user_id)?;
            return Ok(ctx.say_with(
                "lobby_ready_group",
                &[&lobby.id, &lobby.account_type, &partner_line(ctx, &lobby)],
            ));
        }
    }

    if let Some(invite) = ctx.arg(0) {
        let lobby = join_by_token(ctx.conn, invite, ctx.user_id, ctx.scope)?;
        return Ok(vec![ctx.reply(format!(
            "{}\n{}",
            ctx.t("lobby_joined_token"),
            partner_line(ctx, &lobby)
        ))]);
    }

    if ctx.is_new_user && !ctx.scope.is_group() {
        return Ok(vec![language_prompt(ctx)]);
    }

    create_and_welcome(ctx)
}

pub(super) fn help(ctx: &Context) -> Result<Reply> {
    Ok(ctx.say("help"))
}

pub(super) fn language(ctx: &Context) -> Result<Reply> {
    let Some(code) = ctx.arg(0) else {
        let available = Language::ALL
            .iter()
            .map(|language| format!("• {} - {}", language.as_str(), language.native_name()))
            .collect::<Vec<_>>()
            .join("\n");
        return Ok(ctx.say_with(
            "language_current",
            &[&ctx.translator.language().native_name(), &available],
        ));
    };

    let language: Language = code.parse()?;
    set_language(ctx.conn, ctx.user_id, language)?;
    info!(user_id = ctx.user_id, %language, "language changed");

    let ctx = ctx.with_language(language);
    Ok(ctx.say_with("language_changed", &[&language.native_name()]))
}

/// `lang_<code>` button. In a private chat the interrupted /start resumes.
pub(super) fn language_selected(ctx: &Context, payload: &str) -> Result<Reply> {
    let code = payload.strip_prefix("lang_").unwrap_or(payload);
    let language: Language = code.parse()?;
    set_language(ctx.conn, ctx.user_id, language)?;
    info!(user_id = ctx.user_id, %language, "language selected");

    let ctx = ctx.with_language(language);
    let mut reply = ctx.say_with("language_changed", &[&language.native_name()]);

    if !ctx.scope.is_group() {
        match find_lobby_for_member(ctx.conn, ctx.user_id, ctx.scope)? {
            Some(lobby) => reply.extend(welcome_back(&ctx, &lobby)),
            None => reply.extend(create_and_welcome(&ctx)?),
        }
    }
    Ok(reply)
}

pub(super) fn invite(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;

    if lobby.is_full() {
        return Ok(ctx.say("invite_full"));
    }
    if ctx.scope.is_group() {
        return Ok(ctx.say("invite_group"));
    }

    let invite = lobby
        .invite_token
        .as_deref()
        .ok_or_else(|| LedgerError::not_found(Entity::InviteToken, lobby.id))?;
    Ok(ctx.say_with("invite_info", &[&token::format_for_display(invite)]))
}

pub(super) fn regenerate_invite(ctx: &Context) -> Result<Reply> {
    let lobby = ctx.lobby()?;
    let fresh = regenerate_token(ctx.conn, lobby.id, ctx.user_id)?;
    Ok(ctx.say_with("invite_regenerated", &[&token::format_for_display(&fresh)]))
}
