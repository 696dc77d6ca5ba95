// End-to-end chat flows through the dispatcher, as a transport would drive it.

use chrono::NaiveDate;
use couple_ledger::ledger::{get_expense, recent_expenses};
use couple_ledger::lobbies::find_lobby_for_member;
use couple_ledger::payment_methods::find_payment_method_by_name;
use couple_ledger::{
    open_database, setup_database, AccountType, Bot, ChatKind, ChatScope, FixedClock,
    InboundCallback, InboundCommand, Language, Lobby, OutboundMessage, Translator,
};
use rusqlite::Connection;

const ANA: i64 = 1001;
const BETO: i64 = 1002;
const CARLA: i64 = 1003;
const GROUP: i64 = -500;

fn bot_on(conn: Connection) -> Bot {
    let now = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    Bot::new(conn, Box::new(FixedClock(now)), Language::English)
}

fn bot() -> Bot {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    bot_on(conn)
}

fn name_of(user_id: i64) -> &'static str {
    match user_id {
        ANA => "Ana",
        BETO => "Beto",
        _ => "Carla",
    }
}

fn send(
    bot: &Bot,
    user_id: i64,
    chat_id: i64,
    chat_kind: ChatKind,
    text: &str,
) -> Vec<OutboundMessage> {
    let (command, args) = text.split_once(' ').unwrap_or((text, ""));
    bot.handle_command(&InboundCommand {
        user_id,
        username: None,
        display_name: Some(name_of(user_id).to_string()),
        chat_id,
        chat_kind,
        command: command.to_string(),
        args: args.to_string(),
    })
}

fn private(bot: &Bot, user_id: i64, text: &str) -> String {
    joined(&send(bot, user_id, user_id, ChatKind::Private, text))
}

fn group(bot: &Bot, user_id: i64, text: &str) -> String {
    joined(&send(bot, user_id, GROUP, ChatKind::Group, text))
}

fn press(bot: &Bot, user_id: i64, payload: &str) -> Vec<OutboundMessage> {
    bot.handle_callback(&InboundCallback {
        user_id,
        display_name: None,
        chat_id: user_id,
        chat_kind: ChatKind::Private,
        payload: payload.to_string(),
    })
}

fn joined(messages: &[OutboundMessage]) -> String {
    messages
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn en(key: &str) -> String {
    Translator::new(Language::English).t(key)
}

fn private_lobby(bot: &Bot, user_id: i64) -> Lobby {
    find_lobby_for_member(bot.connection(), user_id, ChatScope::Private)
        .unwrap()
        .unwrap()
}

/// Ana creates a private lobby and Beto joins it with her token.
fn paired_bot() -> Bot {
    let bot = bot();
    private(&bot, ANA, "/start");
    press(&bot, ANA, "lang_en");
    let token = private_lobby(&bot, ANA).invite_token.unwrap();
    let reply = private(&bot, BETO, &format!("/start {}", token));
    assert!(reply.contains(&en("lobby_joined_token")), "{}", reply);
    bot
}

// ============================================================================
// SESSION
// ============================================================================

#[test]
fn test_first_private_start_asks_for_language() {
    let bot = bot();
    let reply = send(&bot, ANA, ANA, ChatKind::Private, "/start");

    assert_eq!(reply.len(), 1);
    let payloads: Vec<&str> = reply[0].options.iter().map(|o| o.payload.as_str()).collect();
    assert_eq!(payloads, vec!["lang_en", "lang_es_AR"]);
    assert!(find_lobby_for_member(bot.connection(), ANA, ChatScope::Private)
        .unwrap()
        .is_none());
}

#[test]
fn test_language_choice_resumes_start_in_spanish() {
    let bot = bot();
    private(&bot, ANA, "/start");
    let reply = press(&bot, ANA, "lang_es_AR");

    assert_eq!(reply.len(), 3);
    assert!(reply[1].text.contains("Creé un nuevo lobby"));
    let lobby = private_lobby(&bot, ANA);
    assert_eq!(lobby.user1_telegram_id, ANA);
    assert_eq!(lobby.account_type, AccountType::Separate);

    let help = private(&bot, ANA, "/help");
    assert_eq!(help, Translator::new(Language::SpanishArgentina).t("help"));
}

#[test]
fn test_second_start_welcomes_back() {
    let bot = paired_bot();
    let reply = private(&bot, BETO, "/start");
    assert!(reply.contains("Welcome back, Beto"), "{}", reply);
    assert!(reply.contains("Ana"));
}

#[test]
fn test_partner_token_fills_the_lobby() {
    let bot = paired_bot();
    let lobby = private_lobby(&bot, ANA);
    assert_eq!(lobby.user2_telegram_id, Some(BETO));

    let token = lobby.invite_token.unwrap();
    let reply = private(&bot, CARLA, &format!("/start {}", token));
    assert_eq!(reply, en("error_lobby_full"));
    assert_eq!(private(&bot, ANA, "/invite"), en("invite_full"));
}

#[test]
fn test_unknown_token_is_rejected() {
    let bot = bot();
    let reply = private(&bot, BETO, "/start 0000-not-a-token");
    assert_eq!(reply, en("error_invalid_token"));
}

#[test]
fn test_group_start_auto_joins_second_member() {
    let bot = bot();

    let created = group(&bot, ANA, "/start");
    assert!(created.contains("created a lobby for this group"), "{}", created);

    let ready = group(&bot, BETO, "/start");
    assert!(ready.contains("Lobby is ready"), "{}", ready);

    let lobby = find_lobby_for_member(bot.connection(), BETO, ChatScope::Group(GROUP))
        .unwrap()
        .unwrap();
    assert_eq!(lobby.user1_telegram_id, ANA);
    assert_eq!(lobby.group_chat_id, Some(GROUP));

    assert_eq!(group(&bot, CARLA, "/start"), en("error_lobby_full"));
}

#[test]
fn test_private_and_group_lobbies_are_separate() {
    let bot = paired_bot();
    group(&bot, ANA, "/start");
    private(&bot, ANA, "/add 10 Coffee");

    let reply = group(&bot, ANA, "/list");
    assert!(reply.contains("No expenses found for 2024-03"), "{}", reply);
    assert!(!reply.contains("Coffee"));
}

#[test]
fn test_only_owner_regenerates_invite() {
    let bot = paired_bot();
    let before = private_lobby(&bot, ANA).invite_token;

    assert_eq!(private(&bot, BETO, "/regenerate_invite"), en("error_not_owner"));

    let reply = private(&bot, ANA, "/regenerate_invite");
    assert!(reply.contains("New invitation token"), "{}", reply);
    assert_ne!(private_lobby(&bot, ANA).invite_token, before);
}

#[test]
fn test_commands_without_lobby() {
    let bot = bot();
    assert_eq!(private(&bot, CARLA, "/settle"), en("error_lobby_not_found"));
}

// ============================================================================
// EXPENSES
// ============================================================================

#[test]
fn test_add_stamps_billing_period() {
    let bot = paired_bot();
    let added = private(&bot, ANA, "/payment_methods add Visa credit_card 20");
    assert!(added.contains("*Visa*"), "{}", added);

    let reply = private(&bot, ANA, "/add 120.50 Dinner Food visa");
    assert!(reply.contains("120.50"), "{}", reply);
    assert!(reply.contains("Billing Period: 2024-03-01 to 2024-03-20"), "{}", reply);

    let listed = private(&bot, BETO, "/list_billing Visa");
    assert!(listed.contains("Dinner"), "{}", listed);
    assert!(listed.contains("Period: 2024-02-21 to 2024-03-20"), "{}", listed);
}

#[test]
fn test_billing_report_needs_closing_day() {
    let bot = paired_bot();
    private(&bot, ANA, "/payment_methods add Cash cash");
    assert_eq!(private(&bot, ANA, "/list_billing Cash"), en("expense_billing_no_cycle"));
}

#[test]
fn test_unknown_payment_method_is_not_recorded() {
    let bot = paired_bot();
    private(&bot, ANA, "/payment_methods add Visa credit_card 20");

    let reply = private(&bot, ANA, "/add 10 Coffee Food Amex");
    assert!(reply.contains("Amex"), "{}", reply);
    assert!(reply.contains("Visa"));

    let lobby = private_lobby(&bot, ANA);
    assert!(recent_expenses(bot.connection(), lobby.id, 10).unwrap().is_empty());
}

#[test]
fn test_add_on_behalf_of_partner() {
    let bot = paired_bot();
    let reply = private(&bot, ANA, "/add 30 Lunch Food partner");
    assert!(reply.contains("Beto"), "{}", reply);

    let lobby = private_lobby(&bot, ANA);
    let expense = &recent_expenses(bot.connection(), lobby.id, 1).unwrap()[0];
    assert_eq!(expense.spender_telegram_id, BETO);
    assert_eq!(expense.amount, 30.0);
}

#[test]
fn test_add_rejects_bad_amount() {
    let bot = paired_bot();
    assert_eq!(private(&bot, ANA, "/add lots Dinner"), en("expense_invalid_amount"));
}

#[test]
fn test_edit_then_delete_expense() {
    let bot = paired_bot();
    private(&bot, ANA, "/add 50 Groceries Food");
    let lobby = private_lobby(&bot, ANA);
    let id = recent_expenses(bot.connection(), lobby.id, 1).unwrap()[0].id;

    let edited = private(&bot, BETO, &format!("/edit {} amount 80", id));
    assert!(edited.contains(&en("expense_edited")), "{}", edited);
    private(&bot, BETO, &format!("/edit {} date 2024-02-10", id));

    let expense = get_expense(bot.connection(), id).unwrap();
    assert_eq!(expense.amount, 80.0);
    assert_eq!(
        expense.expense_date,
        NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    );

    assert_eq!(private(&bot, ANA, &format!("/delete {}", id)), en("expense_deleted"));
    assert_eq!(private(&bot, ANA, &format!("/delete {}", id)), en("expense_not_found"));
}

#[test]
fn test_cannot_touch_another_lobbys_expense() {
    let bot = paired_bot();
    private(&bot, ANA, "/add 50 Groceries");
    let id = recent_expenses(bot.connection(), private_lobby(&bot, ANA).id, 1).unwrap()[0].id;

    private(&bot, CARLA, "/start");
    press(&bot, CARLA, "lang_en");
    assert_eq!(private(&bot, CARLA, &format!("/delete {}", id)), en("expense_not_found"));
    assert!(get_expense(bot.connection(), id).is_ok());
}

#[test]
fn test_delete_without_id_lists_recent() {
    let bot = paired_bot();
    assert_eq!(private(&bot, ANA, "/delete"), en("expense_delete_none"));
    private(&bot, ANA, "/add 12 Bus");
    let reply = private(&bot, ANA, "/delete");
    assert!(reply.contains("Bus"), "{}", reply);
}

// ============================================================================
// REPORTS
// ============================================================================

#[test]
fn test_settle_separate_accounts() {
    let bot = paired_bot();
    private(&bot, ANA, "/add 100 Groceries");
    private(&bot, BETO, "/add 50 Taxi");

    let reply = private(&bot, ANA, "/settle");
    assert!(reply.contains("Total Expenses: 150.00"), "{}", reply);
    assert!(reply.contains("Expected per person: 75.00"), "{}", reply);
    assert!(reply.contains("User 2 owes User 1: 25.00"), "{}", reply);
    assert_eq!(reply.matches("owes").count(), 1, "{}", reply);
}

#[test]
fn test_settle_shared_by_salary() {
    let bot = paired_bot();
    assert_eq!(private(&bot, ANA, "/settings account_type shared"), en("settings_updated"));
    assert_eq!(private(&bot, ANA, "/settings salary 0.6 0.4"), en("settings_updated"));
    private(&bot, ANA, "/add 100 Rent");
    private(&bot, BETO, "/add 50 Power");

    let reply = private(&bot, BETO, "/settle");
    assert!(reply.contains("User 1 Expected (60.0%): 90.00"), "{}", reply);
    assert!(reply.contains("User 2 owes User 1: 10.00"), "{}", reply);
}

#[test]
fn test_settings_reject_out_of_range_share() {
    let bot = paired_bot();
    assert_eq!(private(&bot, ANA, "/settings salary 60 40"), en("settings_pct_range"));
    let lobby = private_lobby(&bot, ANA);
    assert_eq!(lobby.user1_salary_percentage, 0.5);
}

#[test]
fn test_settle_all_settled_when_even() {
    let bot = paired_bot();
    private(&bot, ANA, "/add 40 Movies");
    private(&bot, BETO, "/add 40 Dinner");
    let reply = private(&bot, ANA, "/settle 2024-03");
    assert!(reply.contains(&en("settle_all_settled")), "{}", reply);
}

#[test]
fn test_settle_billing_uses_card_cycle_only() {
    let bot = paired_bot();
    private(&bot, ANA, "/payment_methods add Visa credit_card 20");
    private(&bot, ANA, "/add 100 Dinner Food visa");
    private(&bot, BETO, "/add 50 Taxi Transport Visa");
    private(&bot, ANA, "/add 999 Rent Home");

    let reply = private(&bot, ANA, "/settle_billing Visa 2024-03");
    assert!(reply.contains("Period: 2024-02-21 to 2024-03-20 (Visa)"), "{}", reply);
    assert!(reply.contains("Total Expenses: 150.00"), "{}", reply);
    assert!(reply.contains("User 2 owes User 1: 25.00"), "{}", reply);

    let summary = private(&bot, BETO, "/summary_billing Visa 2024-03");
    assert!(summary.contains("Number of Expenses: 2"), "{}", summary);
    assert!(!summary.contains("999.00"), "{}", summary);

    let previous = private(&bot, ANA, "/settle_billing Visa 2024-02");
    assert!(previous.contains("Total Expenses: 0.00"), "{}", previous);
}

#[test]
fn test_summary_counts_expenses() {
    let bot = paired_bot();
    private(&bot, ANA, "/add 100 Groceries Food");
    private(&bot, BETO, "/add 50 Taxi Transport");

    let reply = private(&bot, ANA, "/summary");
    assert!(reply.contains("Number of Expenses: 2"), "{}", reply);
    assert!(reply.contains("Food"));
    assert!(reply.contains("Transport"));
}

#[test]
fn test_analyze_compares_with_previous_month() {
    let bot = paired_bot();
    private(&bot, ANA, "/add 100 Groceries Food");
    private(&bot, ANA, "/add 40 Groceries Food");
    let lobby = private_lobby(&bot, ANA);
    let id = recent_expenses(bot.connection(), lobby.id, 1).unwrap()[0].id;
    private(&bot, ANA, &format!("/edit {} date 2024-02-10", id));

    let reply = private(&bot, ANA, "/analyze");
    assert!(reply.contains("Current Period: 2024-03"), "{}", reply);
    assert!(reply.contains("Previous Period: 2024-02"), "{}", reply);
    assert!(reply.contains("100.00"));
    assert!(reply.contains("40.00"));
}

#[test]
fn test_range_report_rejects_inverted_dates() {
    let bot = paired_bot();
    assert_eq!(
        private(&bot, ANA, "/list 2024-03-10 2024-03-01"),
        en("error_invalid_period")
    );
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_payment_method_lifecycle() {
    let bot = paired_bot();
    private(&bot, ANA, "/payment_methods add Cash cash");
    let lobby = private_lobby(&bot, ANA);
    let cash = find_payment_method_by_name(bot.connection(), lobby.id, "Cash")
        .unwrap()
        .unwrap();

    let duplicate = private(&bot, BETO, "/payment_methods add cash cash");
    assert!(duplicate.contains("already exists"), "{}", duplicate);

    let renamed = private(&bot, BETO, &format!("/payment_methods edit {} name Efectivo", cash.id));
    assert!(renamed.contains("Efectivo"), "{}", renamed);

    let owner = private(&bot, ANA, &format!("/payment_methods edit {} owner partner", cash.id));
    assert!(owner.contains("Beto"), "{}", owner);

    assert_eq!(
        private(&bot, ANA, &format!("/payment_methods delete {}", cash.id)),
        en("payment_method_deleted")
    );
    assert!(find_payment_method_by_name(bot.connection(), lobby.id, "Efectivo")
        .unwrap()
        .is_none());
    assert!(private(&bot, ANA, "/payment_methods").contains("❌"));
}

#[test]
fn test_credit_card_requires_closing_day() {
    let bot = paired_bot();
    assert_eq!(
        private(&bot, ANA, "/payment_methods add Visa credit_card"),
        en("payment_method_closing_required")
    );
}

#[test]
fn test_language_command_changes_replies() {
    let bot = paired_bot();
    let reply = private(&bot, BETO, "/language es_AR");
    assert!(reply.contains("Idioma cambiado"), "{}", reply);
    assert_eq!(
        private(&bot, BETO, "/settle_billing"),
        Translator::new(Language::SpanishArgentina).t("settle_usage")
    );
    assert!(private(&bot, BETO, "/language klingon").contains("en, es_AR"));
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_lobby_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    {
        let bot = bot_on(open_database(&path).unwrap());
        private(&bot, ANA, "/start");
        press(&bot, ANA, "lang_en");
        private(&bot, ANA, "/add 25 Snacks");
    }

    let bot = bot_on(open_database(&path).unwrap());
    let reply = private(&bot, ANA, "/start");
    assert!(reply.contains("Welcome back, Ana"), "{}", reply);
    assert!(private(&bot, ANA, "/list").contains("Snacks"));
}
