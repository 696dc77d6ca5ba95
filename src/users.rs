// 👤 User store

use crate::db::DbTimestamp;
use crate::entities::{Language, User};
use crate::error::{Entity, LedgerError, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

const USER_COLUMNS: &str = "telegram_id, username, display_name, language, created_at";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        telegram_id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        language: row.get(3)?,
        created_at: row.get::<_, DbTimestamp>(4)?.0,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Fetch the user, creating it with `language` when unknown.
///
/// Returns `(user, is_new)`. Known users get their username and display name
/// refreshed when supplied; missing values keep what is stored.
pub fn get_or_create_user(
    conn: &Connection,
    telegram_id: i64,
    username: Option<&str>,
    display_name: Option<&str>,
    language: Language,
    now: NaiveDateTime,
) -> Result<(User, bool)> {
    let username = non_blank(username);
    let display_name = non_blank(display_name);

    if let Some(mut user) = find_user(conn, telegram_id)? {
        if username.is_some() || display_name.is_some() {
            conn.execute(
                "UPDATE users SET username = COALESCE(?1, username),
                     display_name = COALESCE(?2, display_name)
                 WHERE telegram_id = ?3",
                params![username, display_name, telegram_id],
            )?;
            if let Some(username) = username {
                user.username = Some(username.to_string());
            }
            if let Some(display_name) = display_name {
                user.display_name = Some(display_name.to_string());
            }
        }
        return Ok((user, false));
    }

    conn.execute(
        "INSERT INTO users (telegram_id, username, display_name, language, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![telegram_id, username, display_name, language, DbTimestamp(now)],
    )?;
    info!(telegram_id, "registered new user");

    Ok((
        User {
            telegram_id,
            username: username.map(String::from),
            display_name: display_name.map(String::from),
            language,
            created_at: now,
        },
        true,
    ))
}

pub fn find_user(conn: &Connection, telegram_id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE telegram_id = ?1", USER_COLUMNS);
    Ok(conn
        .query_row(&sql, [telegram_id], row_to_user)
        .optional()?)
}

pub fn get_user(conn: &Connection, telegram_id: i64) -> Result<User> {
    find_user(conn, telegram_id)?
        .ok_or_else(|| LedgerError::not_found(Entity::User, telegram_id))
}

pub fn set_language(conn: &Connection, telegram_id: i64, language: Language) -> Result<()> {
    let changed = conn.execute(
        "UPDATE users SET language = ?1 WHERE telegram_id = ?2",
        params![language, telegram_id],
    )?;
    if changed == 0 {
        return Err(LedgerError::not_found(Entity::User, telegram_id));
    }
    Ok(())
}

/// Best-effort label for any participant id. Lookup failures fall back to
/// `User <id>`.
pub fn display_label(conn: &Connection, telegram_id: i64) -> String {
    match find_user(conn, telegram_id) {
        Ok(Some(user)) => user.label(),
        _ => format!("User {}", telegram_id),
    }
}
