// ❗ Error taxonomy for the ledger core
//
// Four kinds of failure leave the core:
//   not-found  -> lookup missed (lobby, expense, payment method, user, token)
//   validation -> input rejected before any write
//   conflict   -> membership rule violated (full lobby, wrong chat, ...)
//   storage    -> SQLite failure, propagated as-is
//
// None of these carry display text. The bot layer maps each variant to a
// localization key.

use std::fmt;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Lobby,
    PaymentMethod,
    Expense,
    InviteToken,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Lobby => "lobby",
            Entity::PaymentMethod => "payment method",
            Entity::Expense => "expense",
            Entity::InviteToken => "invite token",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("amount must be a positive number: {0}")]
    InvalidAmount(String),

    #[error("salary share must be between 0 and 1, got {0}")]
    ShareOutOfRange(f64),

    #[error("unknown account type: {0}")]
    InvalidAccountType(String),

    #[error("unknown payment method type: {0}")]
    InvalidPaymentMethodType(String),

    #[error("closing day must be between 1 and 31, got {0}")]
    InvalidClosingDay(i64),

    #[error("credit cards require a closing day")]
    ClosingDayRequired,

    #[error("payment method name must not be empty")]
    EmptyName,

    #[error("payment method name already in use: {0}")]
    DuplicatePaymentMethodName(String),

    #[error("unable to parse date: {0}")]
    InvalidDate(String),

    #[error("unable to parse period: {0}")]
    InvalidPeriod(String),

    #[error("spender is not a member of this lobby: {0}")]
    UnknownSpender(String),

    #[error("partner has not joined the lobby yet")]
    PartnerMissing,

    #[error("unsupported language: {0}")]
    InvalidLanguage(String),

    #[error("payment method has no billing cycle: {0}")]
    NoBillingCycle(String),

    #[error("unknown chat kind: {0}")]
    InvalidChatKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("lobby is already full")]
    LobbyFull,

    #[error("user is already a member of this lobby")]
    AlreadyMember,

    #[error("invitation token belongs to a different chat")]
    TokenForDifferentChat,

    #[error("invitation token belongs to a group chat")]
    TokenForGroupChat,

    #[error("only the lobby creator can do this")]
    NotLobbyOwner,
}
