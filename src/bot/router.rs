// Command and callback lookup tables, built once per Bot.

use super::{expenses, lobby, reports, settings, Context, Reply};
use crate::error::Result;
use std::collections::HashMap;

pub type CommandHandler = fn(&Context) -> Result<Reply>;

/// Receives the raw callback payload.
pub type CallbackHandler = fn(&Context, &str) -> Result<Reply>;

#[derive(Default)]
pub struct Router {
    commands: HashMap<&'static str, CommandHandler>,
    callbacks: HashMap<&'static str, CallbackHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command the bot understands.
    pub fn standard() -> Self {
        let mut router = Router::new();

        // Session
        router.register_command("start", lobby::start);
        router.register_command("help", lobby::help);
        router.register_command("language", lobby::language);
        router.register_command("invite", lobby::invite);
        router.register_command("regenerate_invite", lobby::regenerate_invite);
        router.register_callback("lang_en", lobby::language_selected);
        router.register_callback("lang_es_AR", lobby::language_selected);

        // Expenses
        router.register_command("add", expenses::add);
        router.register_command("list", expenses::list);
        router.register_command("list_billing", expenses::list_billing);
        router.register_command("delete", expenses::delete);
        router.register_command("edit", expenses::edit);

        // Reports
        router.register_command("summary", reports::summary);
        router.register_command("summary_billing", reports::summary_billing);
        router.register_command("settle", reports::settle);
        router.register_command("settle_billing", reports::settle_billing);
        router.register_command("analyze", reports::analyze);

        // Configuration
        router.register_command("payment_methods", settings::payment_methods);
        router.register_command("settings", settings::settings);

        router
    }

    pub fn register_command(&mut self, name: &'static str, handler: CommandHandler) {
        self.commands.insert(name, handler);
    }

    pub fn register_callback(&mut self, payload: &'static str, handler: CallbackHandler) {
        self.callbacks.insert(payload, handler);
    }

    pub fn command(&self, name: &str) -> Option<CommandHandler> {
        self.commands.get(name).copied()
    }

    pub fn callback(&self, payload: &str) -> Option<CallbackHandler> {
        self.callbacks.get(payload).copied()
    }

    /// Sorted, for help listings and diagnostics.
    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_routes() {
        let router = Router::standard();
        let names = router.command_names();

        assert_eq!(names.len(), 17);
        for name in [
            "start",
            "add",
            "list_billing",
            "settle_billing",
            "payment_methods",
            "regenerate_invite",
        ] {
            assert!(router.command(name).is_some(), "missing /{}", name);
        }
        assert!(router.callback("lang_es_AR").is_some());
        assert!(router.callback("lang_fr").is_none());
    }
}
