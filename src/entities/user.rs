// 👤 User Entity - chat-platform identity plus language preference
//
// The telegram id IS the identity. Username and display name are values that
// get refreshed every time the user runs /start.

use crate::error::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// LANGUAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    /// English (fallback for every missing translation)
    #[default]
    #[serde(rename = "en")]
    English,

    /// Spanish (Argentina)
    #[serde(rename = "es_AR")]
    SpanishArgentina,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::SpanishArgentina];

    /// Storage and callback code
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::SpanishArgentina => "es_AR",
        }
    }

    /// Name shown in language pickers
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::SpanishArgentina => "Español (Argentina)",
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "es_ar" | "es-ar" | "es" | "spanish" | "español" => Ok(Language::SpanishArgentina),
            _ => Err(ValidationError::InvalidLanguage(code.trim().to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// USER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub language: Language,
    pub created_at: NaiveDateTime,
}

impl User {
    /// Best available human label: display name, then @username, then the id.
    pub fn label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        if let Some(username) = self.username.as_deref().filter(|u| !u.trim().is_empty()) {
            return format!("@{}", username);
        }
        format!("User {}", self.telegram_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user(display_name: Option<&str>, username: Option<&str>) -> User {
        User {
            telegram_id: 77,
            username: username.map(String::from),
            display_name: display_name.map(String::from),
            language: Language::English,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_language_codes() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!("es_AR".parse::<Language>().unwrap(), Language::SpanishArgentina);
        assert_eq!("Español".parse::<Language>().unwrap(), Language::SpanishArgentina);
        assert_eq!(Language::SpanishArgentina.as_str(), "es_AR");
        assert!(matches!(
            "fr".parse::<Language>(),
            Err(ValidationError::InvalidLanguage(code)) if code == "fr"
        ));
    }

    #[test]
    fn test_language_serde_uses_codes() {
        let json = serde_json::to_string(&Language::SpanishArgentina).unwrap();
        assert_eq!(json, "\"es_AR\"");
    }

    #[test]
    fn test_label_fallback_chain() {
        assert_eq!(user(Some("Ana"), Some("ana_b")).label(), "Ana");
        assert_eq!(user(None, Some("ana_b")).label(), "@ana_b");
        assert_eq!(user(Some("  "), None).label(), "User 77");
    }
}
