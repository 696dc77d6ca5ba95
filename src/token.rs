// 🔑 Invitation tokens
//
// Stored raw (32 lowercase hex chars, 128 random bits). Shown to users as four
// dash-separated groups of eight; dashes are stripped again on input.

use uuid::Uuid;

pub const TOKEN_LEN: usize = 32;

/// Fresh random token.
pub fn generate() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `xxxxxxxx-xxxxxxxx-xxxxxxxx-xxxxxxxx` for tokens of the expected length,
/// anything else unchanged.
pub fn format_for_display(token: &str) -> String {
    if token.len() != TOKEN_LEN || !token.is_ascii() {
        return token.to_string();
    }
    format!(
        "{}-{}-{}-{}",
        &token[0..8],
        &token[8..16],
        &token[16..24],
        &token[24..32]
    )
}

/// Normalize user input back to the stored form.
pub fn parse(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
