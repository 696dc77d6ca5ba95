// 🗄️ SQLite store - schema and column codecs
//
// Every store module (`users`, `lobbies`, `payment_methods`, `ledger`) works
// with free functions over a borrowed `&Connection`; this file owns the schema
// they share and the conversions between domain enums and TEXT columns.

use crate::entities::{AccountType, Language, PaymentMethodType};
use crate::error::Result;
use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

/// Storage format for every timestamp column.
///
/// Fixed width (nine fractional digits) so that SQLite's text comparison
/// orders values chronologically. Range and billing-period queries rely on it.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Timestamp wrapper that round-trips through TEXT columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DbTimestamp(pub NaiveDateTime);

impl ToSql for DbTimestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.format(TIMESTAMP_FORMAT).to_string()))
    }
}

impl FromSql for DbTimestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        parse_timestamp(text)
            .map(DbTimestamp)
            .ok_or_else(|| FromSqlError::Other(format!("invalid timestamp: {}", text).into()))
    }
}

/// Accepts the storage format plus the shorter forms SQLite itself produces.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

// ============================================================================
// ENUM COLUMNS
// ============================================================================

macro_rules! text_enum_column {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse::<$ty>()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum_column!(Language);
text_enum_column!(AccountType);
text_enum_column!(PaymentMethodType);

/// Open (or create) the database file and bring the schema up to date.
///
/// The parent directory must already exist.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Users
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id INTEGER PRIMARY KEY,
            username TEXT,
            display_name TEXT,
            language TEXT NOT NULL DEFAULT 'en',
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Lobbies (one couple, optionally bound to a group chat)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS lobbies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user1_telegram_id INTEGER NOT NULL,
            user2_telegram_id INTEGER,
            account_type TEXT NOT NULL DEFAULT 'separate'
                CHECK(account_type IN ('separate', 'shared')),
            user1_salary_percentage REAL NOT NULL DEFAULT 0.5,
            user2_salary_percentage REAL NOT NULL DEFAULT 0.5,
            invite_token TEXT,
            group_chat_id INTEGER,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user1_telegram_id) REFERENCES users(telegram_id),
            FOREIGN KEY (user2_telegram_id) REFERENCES users(telegram_id)
        )",
        [],
    )?;

    // ==========================================================================
    // Payment Methods (soft delete via is_active)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS payment_methods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lobby_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL
                CHECK(type IN ('credit_card', 'debit_card', 'cash', 'bank_transfer', 'other')),
            owner_telegram_id INTEGER,
            closing_day INTEGER CHECK(closing_day IS NULL OR closing_day BETWEEN 1 AND 31),
            billing_cycle_days INTEGER NOT NULL DEFAULT 30,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY (lobby_id) REFERENCES lobbies(id)
        )",
        [],
    )?;

    // ==========================================================================
    // Expenses (billing period denormalized at write time)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lobby_id INTEGER NOT NULL,
            spender_telegram_id INTEGER NOT NULL,
            payment_method_id INTEGER,
            amount REAL NOT NULL,
            description TEXT,
            category TEXT,
            expense_date TEXT NOT NULL,
            billing_period_start TEXT,
            billing_period_end TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (lobby_id) REFERENCES lobbies(id),
            FOREIGN KEY (payment_method_id) REFERENCES payment_methods(id)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_lobby_date ON expenses(lobby_id, expense_date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_billing_period
         ON expenses(lobby_id, payment_method_id, billing_period_start, billing_period_end)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payment_methods_lobby ON payment_methods(lobby_id, is_active)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lobbies_invite_token ON lobbies(invite_token)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lobbies_group_chat ON lobbies(group_chat_id)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('users', 'lobbies', 'payment_methods', 'expenses')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn test_timestamp_round_trip_keeps_nanoseconds() {
        let conn = Connection::open_in_memory().unwrap();
        let instant = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .unwrap();

        let back: DbTimestamp = conn
            .query_row("SELECT ?1", [DbTimestamp(instant)], |row| row.get(0))
            .unwrap();
        assert_eq!(back.0, instant);
    }

    #[test]
    fn test_timestamp_text_orders_chronologically() {
        let conn = Connection::open_in_memory().unwrap();
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let last_instant = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .unwrap();

        let ordered: bool = conn
            .query_row(
                "SELECT ?1 < ?2",
                [DbTimestamp(last_instant), DbTimestamp(midnight)],
                |row| row.get(0),
            )
            .unwrap();
        assert!(ordered);
    }

    #[test]
    fn test_parse_timestamp_accepts_sqlite_forms() {
        assert!(parse_timestamp("2024-01-05 10:00:00").is_some());
        assert!(parse_timestamp("2024-01-05T10:00:00.5").is_some());
        assert!(parse_timestamp("05/01/2024").is_none());
    }

    #[test]
    fn test_open_database_persists_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        drop(open_database(&path).unwrap());

        let reopened = open_database(&path).unwrap();
        let count: i64 = reopened
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert!(path.exists());
    }
}
