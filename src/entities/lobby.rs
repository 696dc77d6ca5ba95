// 💑 Lobby Entity - the two-party pairing every expense belongs to
//
// Participant 1 creates the lobby; participant 2 is NULL until someone joins.
// A lobby is either private (shared between two private chats) or bound to
// exactly one group chat.

use crate::error::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Separate accounts, every expense split 50/50
    #[default]
    Separate,

    /// Shared account, split by salary share
    Shared,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Separate => "separate",
            AccountType::Shared => "shared",
        }
    }
}

impl FromStr for AccountType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "separate" => Ok(AccountType::Separate),
            "shared" => Ok(AccountType::Shared),
            other => Err(ValidationError::InvalidAccountType(other.to_string())),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CHAT SCOPE
// ============================================================================

/// Where a lobby lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "chat_id", rename_all = "snake_case")]
pub enum ChatScope {
    Private,
    Group(i64),
}

impl ChatScope {
    /// Value of the `group_chat_id` column.
    pub fn group_chat_id(&self) -> Option<i64> {
        match self {
            ChatScope::Private => None,
            ChatScope::Group(chat_id) => Some(*chat_id),
        }
    }

    pub fn from_group_chat_id(group_chat_id: Option<i64>) -> Self {
        group_chat_id.map_or(ChatScope::Private, ChatScope::Group)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ChatScope::Group(_))
    }
}

// ============================================================================
// LOBBY ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lobby {
    pub id: i64,
    pub user1_telegram_id: i64,

    /// None until the partner joins
    pub user2_telegram_id: Option<i64>,

    pub account_type: AccountType,

    /// Fractions in [0, 1]. They are not required to sum to 1.
    pub user1_salary_percentage: f64,
    pub user2_salary_percentage: f64,

    /// Raw 32-hex-character token (no dashes)
    pub invite_token: Option<String>,

    pub group_chat_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

impl Lobby {
    pub fn scope(&self) -> ChatScope {
        ChatScope::from_group_chat_id(self.group_chat_id)
    }

    pub fn is_full(&self) -> bool {
        self.user2_telegram_id.is_some()
    }

    pub fn is_member(&self, telegram_id: i64) -> bool {
        self.user1_telegram_id == telegram_id || self.user2_telegram_id == Some(telegram_id)
    }

    pub fn is_owner(&self, telegram_id: i64) -> bool {
        self.user1_telegram_id == telegram_id
    }

    /// The other participant, if the given user is a member and the lobby is full.
    pub fn partner_of(&self, telegram_id: i64) -> Option<i64> {
        if self.user1_telegram_id == telegram_id {
            self.user2_telegram_id
        } else if self.user2_telegram_id == Some(telegram_id) {
            Some(self.user1_telegram_id)
        } else {
            None
        }
    }
}
