// Entity Models
//
// Plain data read back from the store. Each entity owns its enums
// (`as_str` for storage, `FromStr` for user input) but no persistence logic;
// the store modules (`users`, `lobbies`, `payment_methods`, `ledger`) do that.

pub mod expense;
pub mod lobby;
pub mod payment_method;
pub mod user;

pub use expense::Expense;
pub use lobby::{AccountType, ChatScope, Lobby};
pub use payment_method::{PaymentMethod, PaymentMethodType, DEFAULT_BILLING_CYCLE_DAYS};
pub use user::{Language, User};
