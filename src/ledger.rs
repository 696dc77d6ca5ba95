// 📒 Expense Ledger - expense records and period-filtered queries
//
// Every expense paid with a closing-day method is stamped with its billing
// period at write time:
//
//   create  -> period_for_date(expense_date, method.closing_day)
//   update  -> recomputed when the method or the date changes
//
// Cycle queries then filter on the stored stamp (containment), never on the
// raw expense date.

use crate::billing::{period_for_date, BillingPeriod};
use crate::db::DbTimestamp;
use crate::entities::{Expense, Lobby, PaymentMethod};
use crate::error::{Entity, LedgerError, Result, ValidationError};
use crate::payment_methods::get_payment_method_in_lobby;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const EXPENSE_COLUMNS: &str = "id, lobby_id, spender_telegram_id, payment_method_id, amount, \
     description, category, expense_date, billing_period_start, billing_period_end, created_at";

fn row_to_expense(row: &Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        lobby_id: row.get(1)?,
        spender_telegram_id: row.get(2)?,
        payment_method_id: row.get(3)?,
        amount: row.get(4)?,
        description: row.get(5)?,
        category: row.get(6)?,
        expense_date: row.get::<_, DbTimestamp>(7)?.0,
        billing_period_start: row.get::<_, Option<DbTimestamp>>(8)?.map(|t| t.0),
        billing_period_end: row.get::<_, Option<DbTimestamp>>(9)?.map(|t| t.0),
        created_at: row.get::<_, DbTimestamp>(10)?.0,
    })
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Who paid, relative to the member issuing the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpenderChoice {
    #[default]
    Issuer,
    /// The other participant
    Partner,
    User1,
    User2,
    Explicit(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: f64,
    pub description: Option<String>,
    pub category: Option<String>,
    pub expense_date: NaiveDateTime,
    pub payment_method_id: Option<i64>,
    pub spender: SpenderChoice,
}

/// Partial update; `None` leaves a field untouched. An empty description or
/// category clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub expense_date: Option<NaiveDateTime>,
    pub payment_method_id: Option<i64>,
}

fn validate_amount(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidAmount(amount.to_string()).into())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve a spender choice to a participant id.
pub fn resolve_spender(lobby: &Lobby, issuer: i64, choice: SpenderChoice) -> Result<i64> {
    let unknown = |id: i64| ValidationError::UnknownSpender(id.to_string());
    match choice {
        SpenderChoice::Issuer if lobby.is_member(issuer) => Ok(issuer),
        SpenderChoice::Issuer => Err(unknown(issuer).into()),
        SpenderChoice::Partner => {
            if !lobby.is_member(issuer) {
                return Err(unknown(issuer).into());
            }
            lobby
                .partner_of(issuer)
                .ok_or_else(|| ValidationError::PartnerMissing.into())
        }
        SpenderChoice::User1 => Ok(lobby.user1_telegram_id),
        SpenderChoice::User2 => lobby
            .user2_telegram_id
            .ok_or_else(|| ValidationError::PartnerMissing.into()),
        SpenderChoice::Explicit(id) if lobby.is_member(id) => Ok(id),
        SpenderChoice::Explicit(id) => Err(unknown(id).into()),
    }
}

fn billing_stamp(
    method: Option<&PaymentMethod>,
    expense_date: NaiveDateTime,
) -> Option<BillingPeriod> {
    method
        .and_then(|m| m.closing_day)
        .map(|closing_day| period_for_date(expense_date, closing_day))
}

// ============================================================================
// WRITES
// ============================================================================

pub fn create_expense(
    conn: &Connection,
    lobby: &Lobby,
    issuer: i64,
    new: NewExpense,
    now: NaiveDateTime,
) -> Result<Expense> {
    validate_amount(new.amount)?;
    let spender = resolve_spender(lobby, issuer, new.spender)?;

    let method = new
        .payment_method_id
        .map(|id| get_payment_method_in_lobby(conn, lobby.id, id))
        .transpose()?;
    let period = billing_stamp(method.as_ref(), new.expense_date);

    let description = non_blank(new.description);
    let category = non_blank(new.category);

    conn.execute(
        "INSERT INTO expenses
             (lobby_id, spender_telegram_id, payment_method_id, amount, description,
              category, expense_date, billing_period_start, billing_period_end, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            lobby.id,
            spender,
            new.payment_method_id,
            new.amount,
            description,
            category,
            DbTimestamp(new.expense_date),
            period.map(|p| DbTimestamp(p.start)),
            period.map(|p| DbTimestamp(p.end)),
            DbTimestamp(now),
        ],
    )?;

    let expense = Expense {
        id: conn.last_insert_rowid(),
        lobby_id: lobby.id,
        spender_telegram_id: spender,
        payment_method_id: new.payment_method_id,
        amount: new.amount,
        description,
        category,
        expense_date: new.expense_date,
        billing_period_start: period.map(|p| p.start),
        billing_period_end: period.map(|p| p.end),
        created_at: now,
    };

    info!(
        lobby_id = lobby.id,
        expense_id = expense.id,
        spender,
        amount = expense.amount,
        "expense recorded"
    );
    Ok(expense)
}

/// Apply a partial update in one transaction. Changing the payment method or
/// the date re-stamps the billing period; a method without closing day clears it.
pub fn update_expense(conn: &Connection, id: i64, update: ExpenseUpdate) -> Result<Expense> {
    if let Some(amount) = update.amount {
        validate_amount(amount)?;
    }

    let tx = conn.unchecked_transaction()?;
    let mut expense = get_expense(&tx, id)?;

    if let Some(amount) = update.amount {
        expense.amount = amount;
    }
    if let Some(description) = update.description {
        expense.description = non_blank(Some(description));
    }
    if let Some(category) = update.category {
        expense.category = non_blank(Some(category));
    }
    if let Some(date) = update.expense_date {
        expense.expense_date = date;
    }

    let restamp = update.payment_method_id.is_some() || update.expense_date.is_some();
    if let Some(method_id) = update.payment_method_id {
        expense.payment_method_id = Some(method_id);
    }
    if restamp {
        let method = expense
            .payment_method_id
            .map(|method_id| get_payment_method_in_lobby(&tx, expense.lobby_id, method_id))
            .transpose()?;
        let period = billing_stamp(method.as_ref(), expense.expense_date);
        expense.billing_period_start = period.map(|p| p.start);
        expense.billing_period_end = period.map(|p| p.end);
    }

    tx.execute(
        "UPDATE expenses SET amount = ?1, description = ?2, category = ?3, expense_date = ?4,
             payment_method_id = ?5, billing_period_start = ?6, billing_period_end = ?7
         WHERE id = ?8",
        params![
            expense.amount,
            expense.description,
            expense.category,
            DbTimestamp(expense.expense_date),
            expense.payment_method_id,
            expense.billing_period_start.map(DbTimestamp),
            expense.billing_period_end.map(DbTimestamp),
            id,
        ],
    )?;
    tx.commit()?;

    info!(expense_id = id, restamped = restamp, "expense updated");
    Ok(expense)
}

/// Hard delete.
pub fn delete_expense(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM expenses WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(LedgerError::not_found(Entity::Expense, id));
    }
    info!(expense_id = id, "expense deleted");
    Ok(())
}

// ============================================================================
// READS
// ============================================================================

pub fn find_expense(conn: &Connection, id: i64) -> Result<Option<Expense>> {
    let sql = format!("SELECT {} FROM expenses WHERE id = ?1", EXPENSE_COLUMNS);
    Ok(conn.query_row(&sql, [id], row_to_expense).optional()?)
}

pub fn get_expense(conn: &Connection, id: i64) -> Result<Expense> {
    find_expense(conn, id)?.ok_or_else(|| LedgerError::not_found(Entity::Expense, id))
}

/// Expense `id`, reported as missing when it belongs to another lobby.
pub fn get_expense_in_lobby(conn: &Connection, lobby_id: i64, id: i64) -> Result<Expense> {
    match find_expense(conn, id)? {
        Some(expense) if expense.lobby_id == lobby_id => Ok(expense),
        _ => Err(LedgerError::not_found(Entity::Expense, id)),
    }
}

fn collect(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(sql)?;
    let expenses = stmt
        .query_map(params, row_to_expense)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(expenses)
}

/// Inclusive bounds on `expense_date`; newest first.
pub fn expenses_in_range(
    conn: &Connection,
    lobby_id: i64,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    payment_method_id: Option<i64>,
) -> Result<Vec<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses
         WHERE lobby_id = ?1
           AND (?2 IS NULL OR expense_date >= ?2)
           AND (?3 IS NULL OR expense_date <= ?3)
           AND (?4 IS NULL OR payment_method_id = ?4)
         ORDER BY expense_date DESC, created_at DESC, id DESC",
        EXPENSE_COLUMNS
    );
    let expenses = collect(
        conn,
        &sql,
        params![
            lobby_id,
            start.map(DbTimestamp),
            end.map(DbTimestamp),
            payment_method_id
        ],
    )?;
    debug!(lobby_id, count = expenses.len(), "range query");
    Ok(expenses)
}

/// Expenses whose stored billing period lies inside `period`.
pub fn expenses_in_billing_period(
    conn: &Connection,
    lobby_id: i64,
    payment_method_id: i64,
    period: BillingPeriod,
) -> Result<Vec<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses
         WHERE lobby_id = ?1 AND payment_method_id = ?2
           AND billing_period_start >= ?3 AND billing_period_end <= ?4
         ORDER BY expense_date DESC, created_at DESC, id DESC",
        EXPENSE_COLUMNS
    );
    let expenses = collect(
        conn,
        &sql,
        params![
            lobby_id,
            payment_method_id,
            DbTimestamp(period.start),
            DbTimestamp(period.end)
        ],
    )?;
    debug!(lobby_id, payment_method_id, period = %period, count = expenses.len(), "billing query");
    Ok(expenses)
}

/// Latest `limit` expenses by creation.
pub fn recent_expenses(conn: &Connection, lobby_id: i64, limit: usize) -> Result<Vec<Expense>> {
    let sql = format!(
        "SELECT {} FROM expenses WHERE lobby_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2",
        EXPENSE_COLUMNS
    );
    collect(conn, &sql, params![lobby_id, limit as i64])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{period_for_month, ClosingDay};
    use crate::db::setup_database;
    use crate::entities::{AccountType, ChatScope, Language, PaymentMethodType};
    use crate::lobbies::{create_lobby, join_directly};
    use crate::payment_methods::{create_payment_method, NewPaymentMethod};
    use crate::users::get_or_create_user;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn setup() -> (Connection, Lobby) {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        for id in [1, 2] {
            get_or_create_user(&conn, id, None, None, Language::English, at(2024, 1, 1)).unwrap();
        }
        let lobby =
            create_lobby(&conn, 1, AccountType::Separate, ChatScope::Group(-9), at(2024, 1, 1))
                .unwrap();
        let lobby = join_directly(&conn, lobby.id, 2).unwrap();
        (conn, lobby)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn method(
        conn: &Connection,
        lobby_id: i64,
        name: &str,
        closing_day: Option<i64>,
    ) -> PaymentMethod {
        let method_type = if closing_day.is_some() {
            PaymentMethodType::CreditCard
        } else {
            PaymentMethodType::Cash
        };
        create_payment_method(
            conn,
            lobby_id,
            NewPaymentMethod {
                name: name.to_string(),
                method_type,
                owner_telegram_id: None,
                closing_day,
            },
            at(2024, 1, 1),
        )
        .unwrap()
    }

    fn expense(amount: f64, date: NaiveDateTime, method_id: Option<i64>) -> NewExpense {
        NewExpense {
            amount,
            description: Some("Groceries".to_string()),
            category: Some("Food".to_string()),
            expense_date: date,
            payment_method_id: method_id,
            spender: SpenderChoice::Issuer,
        }
    }

    /// Participant 1 pays; recorded at the expense date.
    fn record(
        conn: &Connection,
        lobby: &Lobby,
        amount: f64,
        date: NaiveDateTime,
        method_id: Option<i64>,
    ) -> Expense {
        create_expense(conn, lobby, 1, expense(amount, date, method_id), date).unwrap()
    }

    #[test]
    fn test_create_stamps_billing_period() {
        let (conn, lobby) = setup();
        let visa = method(&conn, lobby.id, "Visa", Some(15));

        let created = record(&conn, &lobby, 100.0, at(2023, 12, 20), Some(visa.id));
        let period = created.billing_period().unwrap();
        assert_eq!(period.start, day(2023, 12, 16).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(period.end.date(), day(2024, 1, 15));

        let stored = get_expense(&conn, created.id).unwrap();
        assert_eq!(stored, created);
    }

    #[test]
    fn test_cash_expense_has_no_period() {
        let (conn, lobby) = setup();
        let cash = method(&conn, lobby.id, "Cash", None);
        let created = record(&conn, &lobby, 10.0, at(2024, 1, 5), Some(cash.id));
        assert_eq!(created.billing_period(), None);
    }

    #[test]
    fn test_create_rejects_bad_amount_and_foreign_method() {
        let (conn, lobby) = setup();
        for amount in [0.0, -5.0, f64::NAN] {
            let bad = expense(amount, at(2024, 1, 5), None);
            let err = create_expense(&conn, &lobby, 1, bad, at(2024, 1, 5)).unwrap_err();
            assert!(matches!(
                err,
                LedgerError::Validation(ValidationError::InvalidAmount(_))
            ));
        }

        let other = create_lobby(
            &conn,
            1,
            AccountType::Separate,
            ChatScope::Private,
            at(2024, 1, 1),
        )
        .unwrap();
        let foreign = method(&conn, other.id, "Foreign", Some(5));
        let stray = expense(5.0, at(2024, 1, 5), Some(foreign.id));
        let err = create_expense(&conn, &lobby, 1, stray, at(2024, 1, 5)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_spender_resolution() {
        let (_conn, lobby) = setup();
        assert_eq!(resolve_spender(&lobby, 1, SpenderChoice::Issuer).unwrap(), 1);
        assert_eq!(resolve_spender(&lobby, 1, SpenderChoice::Partner).unwrap(), 2);
        assert_eq!(resolve_spender(&lobby, 2, SpenderChoice::Partner).unwrap(), 1);
        assert_eq!(resolve_spender(&lobby, 2, SpenderChoice::User1).unwrap(), 1);
        assert_eq!(resolve_spender(&lobby, 1, SpenderChoice::Explicit(2)).unwrap(), 2);

        let err = resolve_spender(&lobby, 1, SpenderChoice::Explicit(3)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::UnknownSpender(_))
        ));
        assert!(resolve_spender(&lobby, 3, SpenderChoice::Issuer).is_err());

        let pending = Lobby {
            user2_telegram_id: None,
            ..lobby
        };
        let err = resolve_spender(&pending, 1, SpenderChoice::Partner).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::PartnerMissing)
        ));
    }

    #[test]
    fn test_range_is_inclusive_and_newest_first() {
        let (conn, lobby) = setup();
        let jan = crate::billing::month_bounds(2024, 1).unwrap();

        record(&conn, &lobby, 1.0, jan.start, None);
        record(&conn, &lobby, 2.0, jan.end, None);
        record(&conn, &lobby, 3.0, at(2024, 2, 1), None);

        let found =
            expenses_in_range(&conn, lobby.id, Some(jan.start), Some(jan.end), None).unwrap();
        let amounts: Vec<f64> = found.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![2.0, 1.0]);

        let all = expenses_in_range(&conn, lobby.id, None, None, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].amount, 3.0);
    }

    #[test]
    fn test_same_date_orders_by_creation_newest_first() {
        let (conn, lobby) = setup();
        let spent = at(2024, 1, 10);

        // Insertion order is the reverse of created_at.
        let newer =
            create_expense(&conn, &lobby, 1, expense(5.0, spent, None), at(2024, 1, 12)).unwrap();
        let older =
            create_expense(&conn, &lobby, 2, expense(6.0, spent, None), at(2024, 1, 10)).unwrap();
        assert!(older.id > newer.id);

        let found = expenses_in_range(&conn, lobby.id, None, None, None).unwrap();
        let ids: Vec<i64> = found.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[test]
    fn test_range_filters_by_method() {
        let (conn, lobby) = setup();
        let visa = method(&conn, lobby.id, "Visa", Some(15));
        record(&conn, &lobby, 1.0, at(2024, 1, 3), Some(visa.id));
        record(&conn, &lobby, 2.0, at(2024, 1, 4), None);

        let found = expenses_in_range(&conn, lobby.id, None, None, Some(visa.id)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, 1.0);
    }

    #[test]
    fn test_billing_period_containment() {
        let (conn, lobby) = setup();
        let visa = method(&conn, lobby.id, "Visa", Some(15));

        // Cycle ending Feb 15: Jan 16 .. Feb 15
        record(&conn, &lobby, 10.0, at(2024, 1, 20), Some(visa.id));
        record(&conn, &lobby, 20.0, at(2024, 2, 3), Some(visa.id));
        // Next cycle
        record(&conn, &lobby, 40.0, at(2024, 2, 15), Some(visa.id));
        // Previous cycle
        record(&conn, &lobby, 80.0, at(2024, 1, 10), Some(visa.id));

        let closing = ClosingDay::new(15).unwrap();
        let feb = period_for_month(2024, 2, closing).unwrap();
        let found = expenses_in_billing_period(&conn, lobby.id, visa.id, feb).unwrap();
        let total: f64 = found.iter().map(|e| e.amount).sum();
        assert_eq!(total, 30.0);

        let mar = period_for_month(2024, 3, closing).unwrap();
        let found = expenses_in_billing_period(&conn, lobby.id, visa.id, mar).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, 40.0);
    }

    #[test]
    fn test_update_restamps_on_method_change() {
        let (conn, lobby) = setup();
        let visa = method(&conn, lobby.id, "Visa", Some(15));
        let amex = method(&conn, lobby.id, "Amex", Some(5));
        let cash = method(&conn, lobby.id, "Cash", None);

        let created = record(&conn, &lobby, 50.0, at(2024, 3, 10), Some(visa.id));
        assert_eq!(created.billing_period_end.unwrap().date(), day(2024, 3, 15));

        let moved = update_expense(
            &conn,
            created.id,
            ExpenseUpdate {
                payment_method_id: Some(amex.id),
                ..Default::default()
            },
        )
        .unwrap();
        // Day 10 >= closing 5: Mar 6 .. Apr 5
        assert_eq!(moved.billing_period_start.unwrap().date(), day(2024, 3, 6));
        assert_eq!(moved.billing_period_end.unwrap().date(), day(2024, 4, 5));
        assert_eq!(get_expense(&conn, created.id).unwrap(), moved);

        let cleared = update_expense(
            &conn,
            created.id,
            ExpenseUpdate {
                payment_method_id: Some(cash.id),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cleared.billing_period(), None);
    }

    #[test]
    fn test_update_restamps_on_date_change() {
        let (conn, lobby) = setup();
        let visa = method(&conn, lobby.id, "Visa", Some(15));
        let created = record(&conn, &lobby, 50.0, at(2024, 3, 10), Some(visa.id));

        let updated = update_expense(
            &conn,
            created.id,
            ExpenseUpdate {
                expense_date: Some(at(2024, 3, 20)),
                category: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.billing_period_end.unwrap().date(), day(2024, 4, 15));
        assert_eq!(updated.category, None);
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let (conn, lobby) = setup();
        let created = record(&conn, &lobby, 50.0, at(2024, 3, 10), None);

        let err = update_expense(
            &conn,
            created.id,
            ExpenseUpdate {
                category: Some("Travel".to_string()),
                payment_method_id: Some(999),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(get_expense(&conn, created.id).unwrap().category.as_deref(), Some("Food"));
    }

    #[test]
    fn test_delete_and_lobby_scoping() {
        let (conn, lobby) = setup();
        let created = record(&conn, &lobby, 5.0, at(2024, 3, 10), None);

        assert!(get_expense_in_lobby(&conn, lobby.id + 1, created.id).unwrap_err().is_not_found());
        delete_expense(&conn, created.id).unwrap();
        assert!(get_expense(&conn, created.id).unwrap_err().is_not_found());
        assert!(delete_expense(&conn, created.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_recent_expenses_limit() {
        let (conn, lobby) = setup();
        for d in 1..=12 {
            record(&conn, &lobby, d as f64, at(2024, 1, d), None);
        }
        let recent = recent_expenses(&conn, lobby.id, 10).unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].amount, 12.0);
    }
}
