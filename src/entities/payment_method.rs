// 💳 Payment Method Entity - card, cash or transfer owned by a lobby
//
// Credit cards carry a closing day; it drives the billing period stamped on
// every expense paid with the card.

use crate::billing::ClosingDay;
use crate::error::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Informational cycle length stored with every method.
pub const DEFAULT_BILLING_CYCLE_DAYS: i64 = 30;

// ============================================================================
// PAYMENT METHOD TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    CreditCard,
    DebitCard,
    Cash,
    BankTransfer,
    Other,
}

impl PaymentMethodType {
    pub const ALL: [PaymentMethodType; 5] = [
        PaymentMethodType::CreditCard,
        PaymentMethodType::DebitCard,
        PaymentMethodType::Cash,
        PaymentMethodType::BankTransfer,
        PaymentMethodType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::CreditCard => "credit_card",
            PaymentMethodType::DebitCard => "debit_card",
            PaymentMethodType::Cash => "cash",
            PaymentMethodType::BankTransfer => "bank_transfer",
            PaymentMethodType::Other => "other",
        }
    }

    pub fn requires_closing_day(&self) -> bool {
        matches!(self, PaymentMethodType::CreditCard)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            PaymentMethodType::CreditCard => "💳",
            PaymentMethodType::DebitCard => "🏧",
            PaymentMethodType::Cash => "💵",
            PaymentMethodType::BankTransfer => "🏦",
            PaymentMethodType::Other => "🔖",
        }
    }
}

/// Case-insensitive; Spanish aliases map onto the canonical names.
impl FromStr for PaymentMethodType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_lowercase();
        match lowered.as_str() {
            "credit_card" | "tarjetacredito" | "tarjeta_credito" => {
                Ok(PaymentMethodType::CreditCard)
            }
            "debit_card" | "tarjetadebito" | "tarjeta_debito" => Ok(PaymentMethodType::DebitCard),
            "cash" | "efectivo" => Ok(PaymentMethodType::Cash),
            "bank_transfer" | "transferencia" | "transferencia_bancaria" => {
                Ok(PaymentMethodType::BankTransfer)
            }
            "other" | "otro" => Ok(PaymentMethodType::Other),
            _ => Err(ValidationError::InvalidPaymentMethodType(lowered)),
        }
    }
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PAYMENT METHOD ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub lobby_id: i64,

    /// Unique within the lobby, compared case-insensitively
    pub name: String,

    pub method_type: PaymentMethodType,

    /// None when shared by both participants
    pub owner_telegram_id: Option<i64>,

    pub closing_day: Option<ClosingDay>,
    pub billing_cycle_days: i64,

    /// false once soft-deleted
    pub is_active: bool,

    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_parse() {
        for kind in PaymentMethodType::ALL {
            assert_eq!(kind.as_str().parse::<PaymentMethodType>().unwrap(), kind);
        }
    }

    #[test]
    fn test_spanish_aliases_normalize() {
        let cases = [
            ("tarjetacredito", PaymentMethodType::CreditCard),
            ("Tarjeta_Credito", PaymentMethodType::CreditCard),
            ("tarjeta_debito", PaymentMethodType::DebitCard),
            ("EFECTIVO", PaymentMethodType::Cash),
            ("transferencia_bancaria", PaymentMethodType::BankTransfer),
            ("otro", PaymentMethodType::Other),
        ];
        for (alias, expected) in cases {
            assert_eq!(alias.parse::<PaymentMethodType>().unwrap(), expected, "{}", alias);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert_eq!(
            "crypto".parse::<PaymentMethodType>(),
            Err(ValidationError::InvalidPaymentMethodType("crypto".to_string()))
        );
    }

    #[test]
    fn test_only_credit_cards_require_closing_day() {
        assert!(PaymentMethodType::CreditCard.requires_closing_day());
        assert!(!PaymentMethodType::DebitCard.requires_closing_day());
    }
}
