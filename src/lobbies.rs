// 💑 Lobby / Membership Manager
//
// Lifecycle of a pairing:
//   create (participant 1) -> join (participant 2, once) -> settings changes
//
// Joining is a single conditional UPDATE (`... AND user2_telegram_id IS NULL`)
// so two racing joiners can never both get in.

use crate::db::DbTimestamp;
use crate::entities::{AccountType, ChatScope, Lobby};
use crate::error::{ConflictError, Entity, LedgerError, Result, ValidationError};
use crate::token;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

pub const DEFAULT_SALARY_SHARE: f64 = 0.5;

const LOBBY_COLUMNS: &str = "id, user1_telegram_id, user2_telegram_id, account_type, \
     user1_salary_percentage, user2_salary_percentage, invite_token, group_chat_id, created_at";

fn row_to_lobby(row: &Row) -> rusqlite::Result<Lobby> {
    Ok(Lobby {
        id: row.get(0)?,
        user1_telegram_id: row.get(1)?,
        user2_telegram_id: row.get(2)?,
        account_type: row.get(3)?,
        user1_salary_percentage: row.get(4)?,
        user2_salary_percentage: row.get(5)?,
        invite_token: row.get(6)?,
        group_chat_id: row.get(7)?,
        created_at: row.get::<_, DbTimestamp>(8)?.0,
    })
}

fn query_lobby<P: rusqlite::Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> Result<Option<Lobby>> {
    let sql = format!("SELECT {} FROM lobbies {}", LOBBY_COLUMNS, filter);
    Ok(conn.query_row(&sql, params, row_to_lobby).optional()?)
}

// ============================================================================
// CREATE / LOOKUP
// ============================================================================

pub fn create_lobby(
    conn: &Connection,
    user1_telegram_id: i64,
    account_type: AccountType,
    scope: ChatScope,
    now: NaiveDateTime,
) -> Result<Lobby> {
    let invite_token = token::generate();

    conn.execute(
        "INSERT INTO lobbies (user1_telegram_id, user2_telegram_id, account_type,
             user1_salary_percentage, user2_salary_percentage, invite_token,
             group_chat_id, created_at)
         VALUES (?1, NULL, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user1_telegram_id,
            account_type,
            DEFAULT_SALARY_SHARE,
            DEFAULT_SALARY_SHARE,
            invite_token,
            scope.group_chat_id(),
            DbTimestamp(now),
        ],
    )?;

    let lobby = Lobby {
        id: conn.last_insert_rowid(),
        user1_telegram_id,
        user2_telegram_id: None,
        account_type,
        user1_salary_percentage: DEFAULT_SALARY_SHARE,
        user2_salary_percentage: DEFAULT_SALARY_SHARE,
        invite_token: Some(invite_token),
        group_chat_id: scope.group_chat_id(),
        created_at: now,
    };

    info!(
        lobby_id = lobby.id,
        user1 = user1_telegram_id,
        group_chat_id = ?lobby.group_chat_id,
        "created lobby"
    );
    Ok(lobby)
}

pub fn find_lobby(conn: &Connection, lobby_id: i64) -> Result<Option<Lobby>> {
    query_lobby(conn, "WHERE id = ?1", [lobby_id])
}

pub fn get_lobby(conn: &Connection, lobby_id: i64) -> Result<Lobby> {
    find_lobby(conn, lobby_id)?.ok_or_else(|| LedgerError::not_found(Entity::Lobby, lobby_id))
}

/// Lobby the user belongs to within the given chat scope.
pub fn find_lobby_for_member(
    conn: &Connection,
    telegram_id: i64,
    scope: ChatScope,
) -> Result<Option<Lobby>> {
    let found = match scope {
        ChatScope::Group(chat_id) => query_lobby(
            conn,
            "WHERE (user1_telegram_id = ?1 OR user2_telegram_id = ?1) AND group_chat_id = ?2
             ORDER BY id ASC LIMIT 1",
            params![telegram_id, chat_id],
        )?,
        ChatScope::Private => query_lobby(
            conn,
            "WHERE (user1_telegram_id = ?1 OR user2_telegram_id = ?1) AND group_chat_id IS NULL
             ORDER BY id ASC LIMIT 1",
            [telegram_id],
        )?,
    };
    debug!(telegram_id, ?scope, found = found.is_some(), "lobby lookup");
    Ok(found)
}

/// Oldest lobby bound to a group chat.
pub fn find_lobby_by_group(conn: &Connection, group_chat_id: i64) -> Result<Option<Lobby>> {
    query_lobby(
        conn,
        "WHERE group_chat_id = ?1 ORDER BY created_at ASC, id ASC LIMIT 1",
        [group_chat_id],
    )
}

/// Accepts both the raw and the dashed display form.
pub fn find_lobby_by_token(conn: &Connection, invite_token: &str) -> Result<Option<Lobby>> {
    let cleaned = token::parse(invite_token);
    if cleaned.is_empty() {
        return Ok(None);
    }
    query_lobby(conn, "WHERE invite_token = ?1", [cleaned])
}

// ============================================================================
// MEMBERSHIP
// ============================================================================

/// Occupy the free participant-2 seat. Fails if someone got there first.
fn claim_second_seat(conn: &Connection, lobby: &Lobby, telegram_id: i64) -> Result<Lobby> {
    if lobby.user1_telegram_id == telegram_id || lobby.user2_telegram_id == Some(telegram_id) {
        return Err(ConflictError::AlreadyMember.into());
    }
    if lobby.is_full() {
        return Err(ConflictError::LobbyFull.into());
    }

    let changed = conn.execute(
        "UPDATE lobbies SET user2_telegram_id = ?1 WHERE id = ?2 AND user2_telegram_id IS NULL",
        params![telegram_id, lobby.id],
    )?;
    if changed == 0 {
        return Err(ConflictError::LobbyFull.into());
    }

    info!(lobby_id = lobby.id, user2 = telegram_id, "partner joined lobby");
    Ok(Lobby {
        user2_telegram_id: Some(telegram_id),
        ..lobby.clone()
    })
}

/// Join through an invitation token. The token's lobby must live in the same
/// chat scope the joiner is writing from.
pub fn join_by_token(
    conn: &Connection,
    invite_token: &str,
    telegram_id: i64,
    scope: ChatScope,
) -> Result<Lobby> {
    let lobby = find_lobby_by_token(conn, invite_token)?
        .ok_or_else(|| LedgerError::not_found(Entity::InviteToken, token::parse(invite_token)))?;

    match (scope, lobby.scope()) {
        (ChatScope::Group(joiner_chat), ChatScope::Group(lobby_chat))
            if joiner_chat != lobby_chat =>
        {
            return Err(ConflictError::TokenForDifferentChat.into());
        }
        (ChatScope::Group(_), ChatScope::Private) => {
            return Err(ConflictError::TokenForDifferentChat.into());
        }
        (ChatScope::Private, ChatScope::Group(_)) => {
            return Err(ConflictError::TokenForGroupChat.into());
        }
        _ => {}
    }

    claim_second_seat(conn, &lobby, telegram_id)
}

/// Group auto-join: the second person to /start in a group takes the seat.
pub fn join_directly(conn: &Connection, lobby_id: i64, telegram_id: i64) -> Result<Lobby> {
    let lobby = get_lobby(conn, lobby_id)?;
    claim_second_seat(conn, &lobby, telegram_id)
}

/// New random token; only participant 1 may rotate it.
pub fn regenerate_token(conn: &Connection, lobby_id: i64, requester: i64) -> Result<String> {
    let lobby = get_lobby(conn, lobby_id)?;
    if !lobby.is_owner(requester) {
        return Err(ConflictError::NotLobbyOwner.into());
    }

    let fresh = token::generate();
    conn.execute(
        "UPDATE lobbies SET invite_token = ?1 WHERE id = ?2",
        params![fresh, lobby_id],
    )?;
    info!(lobby_id, "invite token regenerated");
    Ok(fresh)
}

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LobbySettingsUpdate {
    pub account_type: Option<AccountType>,
    pub user1_salary_percentage: Option<f64>,
    pub user2_salary_percentage: Option<f64>,
}

fn validate_share(share: Option<f64>) -> Result<()> {
    match share {
        Some(value) if !(0.0..=1.0).contains(&value) || value.is_nan() => {
            Err(ValidationError::ShareOutOfRange(value).into())
        }
        _ => Ok(()),
    }
}

/// Apply the given fields. Validation happens before anything is written.
pub fn update_settings(
    conn: &Connection,
    lobby_id: i64,
    update: LobbySettingsUpdate,
) -> Result<Lobby> {
    validate_share(update.user1_salary_percentage)?;
    validate_share(update.user2_salary_percentage)?;

    let mut lobby = get_lobby(conn, lobby_id)?;
    if let Some(account_type) = update.account_type {
        lobby.account_type = account_type;
    }
    if let Some(share) = update.user1_salary_percentage {
        lobby.user1_salary_percentage = share;
    }
    if let Some(share) = update.user2_salary_percentage {
        lobby.user2_salary_percentage = share;
    }

    conn.execute(
        "UPDATE lobbies SET account_type = ?1, user1_salary_percentage = ?2,
             user2_salary_percentage = ?3
         WHERE id = ?4",
        params![
            lobby.account_type,
            lobby.user1_salary_percentage,
            lobby.user2_salary_percentage,
            lobby_id
        ],
    )?;

    info!(lobby_id, account_type = lobby.account_type.as_str(), "lobby settings updated");
    Ok(lobby)
}
