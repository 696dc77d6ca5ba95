// 💳 Payment Method Registry
//
// Per-lobby cards, cash and transfers. Names are unique among a lobby's
// active methods (case-insensitive); deleting only flips `is_active` so old
// expenses keep pointing at a real row.

use crate::billing::ClosingDay;
use crate::db::DbTimestamp;
use crate::entities::{PaymentMethod, PaymentMethodType, DEFAULT_BILLING_CYCLE_DAYS};
use crate::error::{Entity, LedgerError, Result, ValidationError};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

const METHOD_COLUMNS: &str = "id, lobby_id, name, type, owner_telegram_id, closing_day, \
     billing_cycle_days, is_active, created_at";

fn row_to_method(row: &Row) -> rusqlite::Result<PaymentMethod> {
    let closing_day: Option<i64> = row.get(5)?;
    let closing_day = closing_day
        .map(ClosingDay::new)
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Integer,
                Box::new(e),
            )
        })?;

    Ok(PaymentMethod {
        id: row.get(0)?,
        lobby_id: row.get(1)?,
        name: row.get(2)?,
        method_type: row.get(3)?,
        owner_telegram_id: row.get(4)?,
        closing_day,
        billing_cycle_days: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get::<_, DbTimestamp>(8)?.0,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentMethod {
    pub name: String,
    pub method_type: PaymentMethodType,
    pub owner_telegram_id: Option<i64>,
    pub closing_day: Option<i64>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentMethodUpdate {
    pub name: Option<String>,
    pub method_type: Option<PaymentMethodType>,
    pub owner_telegram_id: Option<i64>,
    pub closing_day: Option<i64>,
    pub is_active: Option<bool>,
}

fn check_closing_day(
    method_type: PaymentMethodType,
    closing_day: Option<i64>,
) -> Result<Option<ClosingDay>> {
    let closing_day = closing_day.map(ClosingDay::new).transpose()?;
    if method_type.requires_closing_day() && closing_day.is_none() {
        return Err(ValidationError::ClosingDayRequired.into());
    }
    Ok(closing_day)
}

fn check_name_free(
    conn: &Connection,
    lobby_id: i64,
    name: &str,
    except_id: Option<i64>,
) -> Result<()> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM payment_methods
             WHERE lobby_id = ?1 AND is_active = 1 AND name = ?2 COLLATE NOCASE
               AND id != ?3
         )",
        params![lobby_id, name, except_id.unwrap_or(-1)],
        |row| row.get(0),
    )?;
    if taken {
        return Err(ValidationError::DuplicatePaymentMethodName(name.to_string()).into());
    }
    Ok(())
}

fn clean_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// OPERATIONS
// ============================================================================

pub fn create_payment_method(
    conn: &Connection,
    lobby_id: i64,
    new: NewPaymentMethod,
    now: NaiveDateTime,
) -> Result<PaymentMethod> {
    let name = clean_name(&new.name)?;
    let closing_day = check_closing_day(new.method_type, new.closing_day)?;
    check_name_free(conn, lobby_id, &name, None)?;

    conn.execute(
        "INSERT INTO payment_methods
             (lobby_id, name, type, owner_telegram_id, closing_day, billing_cycle_days,
              is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
        params![
            lobby_id,
            name,
            new.method_type,
            new.owner_telegram_id,
            closing_day.map(i64::from),
            DEFAULT_BILLING_CYCLE_DAYS,
            DbTimestamp(now),
        ],
    )?;

    let method = PaymentMethod {
        id: conn.last_insert_rowid(),
        lobby_id,
        name,
        method_type: new.method_type,
        owner_telegram_id: new.owner_telegram_id,
        closing_day,
        billing_cycle_days: DEFAULT_BILLING_CYCLE_DAYS,
        is_active: true,
        created_at: now,
    };
    info!(lobby_id, payment_method_id = method.id, name = %method.name, "payment method created");
    Ok(method)
}

/// Ordered by name.
pub fn list_payment_methods(
    conn: &Connection,
    lobby_id: i64,
    active_only: bool,
) -> Result<Vec<PaymentMethod>> {
    let sql = format!(
        "SELECT {} FROM payment_methods
         WHERE lobby_id = ?1 AND (?2 = 0 OR is_active = 1)
         ORDER BY name COLLATE NOCASE, id",
        METHOD_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let methods = stmt
        .query_map(params![lobby_id, active_only], row_to_method)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(methods)
}

pub fn find_payment_method(conn: &Connection, id: i64) -> Result<Option<PaymentMethod>> {
    let sql = format!("SELECT {} FROM payment_methods WHERE id = ?1", METHOD_COLUMNS);
    Ok(conn.query_row(&sql, [id], row_to_method).optional()?)
}

pub fn get_payment_method(conn: &Connection, id: i64) -> Result<PaymentMethod> {
    find_payment_method(conn, id)?
        .ok_or_else(|| LedgerError::not_found(Entity::PaymentMethod, id))
}

/// Active method with this name (case-insensitive) in the lobby.
pub fn find_payment_method_by_name(
    conn: &Connection,
    lobby_id: i64,
    name: &str,
) -> Result<Option<PaymentMethod>> {
    let sql = format!(
        "SELECT {} FROM payment_methods
         WHERE lobby_id = ?1 AND is_active = 1 AND name = ?2 COLLATE NOCASE
         ORDER BY id LIMIT 1",
        METHOD_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![lobby_id, name.trim()], row_to_method)
        .optional()?)
}

/// Method `id` only if it belongs to `lobby_id`.
pub fn get_payment_method_in_lobby(
    conn: &Connection,
    lobby_id: i64,
    id: i64,
) -> Result<PaymentMethod> {
    match find_payment_method(conn, id)? {
        Some(method) if method.lobby_id == lobby_id => Ok(method),
        _ => Err(LedgerError::not_found(Entity::PaymentMethod, id)),
    }
}

/// Same validation as create, applied to the merged result.
pub fn update_payment_method(
    conn: &Connection,
    id: i64,
    update: PaymentMethodUpdate,
) -> Result<PaymentMethod> {
    let mut method = get_payment_method(conn, id)?;

    if let Some(name) = update.name.as_deref() {
        method.name = clean_name(name)?;
    }
    if let Some(method_type) = update.method_type {
        method.method_type = method_type;
    }
    if let Some(owner) = update.owner_telegram_id {
        method.owner_telegram_id = Some(owner);
    }
    if let Some(active) = update.is_active {
        method.is_active = active;
    }
    let closing_day = update.closing_day.or(method.closing_day.map(i64::from));
    method.closing_day = check_closing_day(method.method_type, closing_day)?;

    if method.is_active {
        check_name_free(conn, method.lobby_id, &method.name, Some(method.id))?;
    }

    conn.execute(
        "UPDATE payment_methods SET name = ?1, type = ?2, owner_telegram_id = ?3,
             closing_day = ?4, is_active = ?5
         WHERE id = ?6",
        params![
            method.name,
            method.method_type,
            method.owner_telegram_id,
            method.closing_day.map(i64::from),
            method.is_active,
            id
        ],
    )?;

    info!(payment_method_id = id, "payment method updated");
    Ok(method)
}

/// Soft delete.
pub fn deactivate_payment_method(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("UPDATE payment_methods SET is_active = 0 WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(LedgerError::not_found(Entity::PaymentMethod, id));
    }
    info!(payment_method_id = id, "payment method deactivated");
    Ok(())
}
