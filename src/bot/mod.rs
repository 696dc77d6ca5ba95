// 🤖 Chat dispatch - inbound commands/callbacks -> outbound messages
//
// Transport-agnostic: the console binary and the HTTP server both hand
// `InboundCommand` / `InboundCallback` values to a `Bot` and deliver whatever
// `OutboundMessage`s come back.
//
// Handlers return `Result<Reply>`. Core errors never carry display text; the
// dispatcher maps each `LedgerError` variant to a localization key here.

mod expenses;
mod lobby;
mod reports;
mod router;
mod settings;

pub use router::{CallbackHandler, CommandHandler, Router};

use crate::clock::Clock;
use crate::entities::{ChatScope, Language, Lobby, User};
use crate::error::{ConflictError, Entity, LedgerError, Result, ValidationError};
use crate::i18n::Translator;
use crate::lobbies::find_lobby_for_member;
use crate::users::{display_label, get_or_create_user};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

/// Messages produced by one handler invocation.
pub type Reply = Vec<OutboundMessage>;

// ============================================================================
// TRANSPORT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Anything but a private chat scopes the lobby to that chat.
    pub fn scope(self, chat_id: i64) -> ChatScope {
        match self {
            ChatKind::Private => ChatScope::Private,
            ChatKind::Group | ChatKind::Supergroup | ChatKind::Channel => ChatScope::Group(chat_id),
        }
    }
}

impl FromStr for ChatKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "private" => Ok(ChatKind::Private),
            "group" => Ok(ChatKind::Group),
            "supergroup" => Ok(ChatKind::Supergroup),
            "channel" => Ok(ChatKind::Channel),
            other => Err(ValidationError::InvalidChatKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundCommand {
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    /// With or without the leading slash; a `@botname` suffix is ignored
    pub command: String,
    #[serde(default)]
    pub args: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundCallback {
    pub user_id: i64,
    #[serde(default)]
    pub display_name: Option<String>,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub payload: String,
}

/// A selectable button under a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyOption {
    pub label: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ReplyOption>,
}

/// `/Add@my_bot` -> `add`
pub fn normalize_command(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('/');
    let name = trimmed.split('@').next().unwrap_or(trimmed);
    name.to_lowercase()
}

// ============================================================================
// REQUEST CONTEXT
// ============================================================================

/// Everything a handler may touch while serving one request.
#[derive(Clone)]
pub struct Context<'a> {
    pub conn: &'a Connection,
    pub clock: &'a dyn Clock,
    pub translator: Translator,
    pub user_id: i64,
    pub chat_id: i64,
    pub scope: ChatScope,
    /// Registered user record; None only if the store refused the upsert
    pub user: Option<User>,
    pub is_new_user: bool,
    pub args: Vec<&'a str>,
}

impl<'a> Context<'a> {
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).copied()
    }

    pub fn t(&self, key: &str) -> String {
        self.translator.t(key)
    }

    pub fn tr(&self, key: &str, args: &[&dyn fmt::Display]) -> String {
        self.translator.tr(key, args)
    }

    pub fn reply(&self, text: impl Into<String>) -> OutboundMessage {
        OutboundMessage {
            chat_id: self.chat_id,
            text: text.into(),
            options: Vec::new(),
        }
    }

    pub fn say(&self, key: &str) -> Reply {
        vec![self.reply(self.t(key))]
    }

    pub fn say_with(&self, key: &str, args: &[&dyn fmt::Display]) -> Reply {
        vec![self.reply(self.tr(key, args))]
    }

    /// Same request, rendered in another language.
    pub fn with_language(&self, language: Language) -> Self {
        Context {
            translator: Translator::new(language),
            ..self.clone()
        }
    }

    /// Lobby of the requesting user in this chat, or `NotFound(Lobby)`.
    pub fn lobby(&self) -> Result<Lobby> {
        find_lobby_for_member(self.conn, self.user_id, self.scope)?
            .ok_or_else(|| LedgerError::not_found(Entity::Lobby, self.user_id))
    }

    pub fn label(&self, telegram_id: i64) -> String {
        display_label(self.conn, telegram_id)
    }

    pub fn own_label(&self) -> String {
        match &self.user {
            Some(user) => user.label(),
            None => self.label(self.user_id),
        }
    }
}

// ============================================================================
// ERROR RENDERING
// ============================================================================

/// Localization key and positional values for a core error.
fn error_message(err: &LedgerError) -> (&'static str, Vec<String>) {
    match err {
        LedgerError::NotFound { entity, key } => match entity {
            Entity::Lobby => ("error_lobby_not_found", vec![]),
            Entity::InviteToken => ("error_invalid_token", vec![]),
            Entity::Expense => ("expense_not_found", vec![]),
            Entity::PaymentMethod => ("payment_method_not_found", vec![key.clone()]),
            Entity::User => ("error_not_found", vec![key.clone()]),
        },
        LedgerError::Validation(validation) => match validation {
            ValidationError::InvalidAmount(_) => ("expense_invalid_amount", vec![]),
            ValidationError::ShareOutOfRange(_) => ("settings_pct_range", vec![]),
            ValidationError::InvalidAccountType(_) => ("settings_invalid_type", vec![]),
            ValidationError::InvalidPaymentMethodType(kind) => {
                ("payment_method_invalid_type", vec![kind.clone()])
            }
            ValidationError::InvalidClosingDay(_) => ("payment_method_closing_invalid", vec![]),
            ValidationError::ClosingDayRequired => ("payment_method_closing_required", vec![]),
            ValidationError::EmptyName => ("payment_method_empty_name", vec![]),
            ValidationError::DuplicatePaymentMethodName(name) => {
                ("payment_method_duplicate", vec![name.clone()])
            }
            ValidationError::InvalidDate(input) => ("error_invalid_date", vec![input.clone()]),
            ValidationError::InvalidPeriod(_) => ("error_invalid_period", vec![]),
            ValidationError::UnknownSpender(_) => ("error_invalid_user_id", vec![]),
            ValidationError::PartnerMissing => ("error_partner_missing", vec![]),
            ValidationError::InvalidLanguage(_) => ("language_invalid", vec![language_codes()]),
            ValidationError::NoBillingCycle(_) => ("expense_billing_no_cycle", vec![]),
            ValidationError::InvalidChatKind(kind) => ("error_not_found", vec![kind.clone()]),
        },
        LedgerError::Conflict(conflict) => match conflict {
            ConflictError::LobbyFull => ("error_lobby_full", vec![]),
            ConflictError::AlreadyMember => ("error_already_member", vec![]),
            ConflictError::TokenForDifferentChat => ("error_token_different_chat", vec![]),
            ConflictError::TokenForGroupChat => ("error_token_group_chat", vec![]),
            ConflictError::NotLobbyOwner => ("error_not_owner", vec![]),
        },
        LedgerError::Storage(_) => ("error_storage", vec![]),
    }
}

/// `en, es_AR`
pub(crate) fn language_codes() -> String {
    Language::ALL
        .iter()
        .map(|language| language.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_error(ctx: &Context, err: &LedgerError) -> Reply {
    if err.is_storage() {
        error!(user_id = ctx.user_id, chat_id = ctx.chat_id, error = %err, "storage failure");
    } else {
        debug!(user_id = ctx.user_id, error = %err, "request rejected");
    }
    let (key, values) = error_message(err);
    let args: Vec<&dyn fmt::Display> = values.iter().map(|v| v as &dyn fmt::Display).collect();
    ctx.say_with(key, &args)
}

// ============================================================================
// BOT
// ============================================================================

pub struct Bot {
    conn: Connection,
    clock: Box<dyn Clock>,
    router: Router,
    default_language: Language,
}

impl Bot {
    /// The connection must already carry the schema (`db::setup_database`).
    pub fn new(conn: Connection, clock: Box<dyn Clock>, default_language: Language) -> Self {
        Bot {
            conn,
            clock,
            router: Router::standard(),
            default_language,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Register (or refresh) the user and build the request context.
    fn context<'a>(
        &'a self,
        user_id: i64,
        username: Option<&str>,
        display_name: Option<&str>,
        chat_id: i64,
        chat_kind: ChatKind,
        args: Vec<&'a str>,
    ) -> Context<'a> {
        let registered = get_or_create_user(
            &self.conn,
            user_id,
            username,
            display_name,
            self.default_language,
            self.clock.now(),
        );

        let (user, is_new_user) = match registered {
            Ok((user, created)) => (Some(user), created),
            Err(err) => {
                warn!(user_id, error = %err, "could not register user");
                (None, false)
            }
        };
        let language = user
            .as_ref()
            .map(|u| u.language)
            .unwrap_or(self.default_language);

        Context {
            conn: &self.conn,
            clock: self.clock.as_ref(),
            translator: Translator::new(language),
            user_id,
            chat_id,
            scope: chat_kind.scope(chat_id),
            user,
            is_new_user,
            args,
        }
    }

    pub fn handle_command(&self, command: &InboundCommand) -> Reply {
        let name = normalize_command(&command.command);
        info!(
            user_id = command.user_id,
            chat_id = command.chat_id,
            command = %name,
            "command received"
        );

        let ctx = self.context(
            command.user_id,
            command.username.as_deref(),
            command.display_name.as_deref(),
            command.chat_id,
            command.chat_kind,
            command.args.split_whitespace().collect(),
        );

        match self.router.command(&name) {
            Some(handler) => handler(&ctx).unwrap_or_else(|err| render_error(&ctx, &err)),
            None => ctx.say_with("error_unknown_command", &[&name]),
        }
    }

    pub fn handle_callback(&self, callback: &InboundCallback) -> Reply {
        let payload = callback.payload.trim();
        info!(
            user_id = callback.user_id,
            chat_id = callback.chat_id,
            payload,
            "callback received"
        );

        let ctx = self.context(
            callback.user_id,
            None,
            callback.display_name.as_deref(),
            callback.chat_id,
            callback.chat_kind,
            Vec::new(),
        );

        match self.router.callback(payload) {
            Some(handler) => handler(&ctx, payload).unwrap_or_else(|err| render_error(&ctx, &err)),
            None => ctx.say("error_unknown_callback"),
        }
    }
}
