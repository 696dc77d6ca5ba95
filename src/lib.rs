// Couple Ledger - Core Library
// Expense splitting for two-person lobbies: billing cycles, settlement,
// spending analysis. Exposes every module for the console bot, the HTTP
// server and the tests.

pub mod error;
pub mod db;
pub mod entities;
pub mod billing;       // Statement-cycle math (pure)
pub mod token;
pub mod format;
pub mod clock;
pub mod config;
pub mod i18n;

// Stores
pub mod users;
pub mod lobbies;
pub mod payment_methods;
pub mod ledger;

// Engines
pub mod settlement;
pub mod analysis;
pub mod summary;

// Chat dispatch
pub mod bot;

// Re-export commonly used types
pub use error::{ConflictError, Entity, LedgerError, Result, ValidationError};
pub use db::{open_database, setup_database};
pub use entities::{
    AccountType, ChatScope, Expense, Language, Lobby, PaymentMethod, PaymentMethodType, User,
};
pub use billing::{
    month_bounds, period_for_date, period_for_month, BillingPeriod, ClosingDay,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{init_logging, Config};
pub use i18n::Translator;
pub use ledger::{ExpenseUpdate, NewExpense, SpenderChoice};
pub use settlement::{compute_settlement, Direction, SettlementResult};
pub use analysis::{analyze_expenses, AnalysisResult};
pub use summary::{summarize, SpendingSummary};
pub use bot::{Bot, ChatKind, InboundCallback, InboundCommand, OutboundMessage, ReplyOption};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
