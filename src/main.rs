// Couple Ledger - Console transport
//
// One inbound event per stdin line:
//   <user_id> <chat_id> <chat_kind> /command args...
//   <user_id> <chat_id> <chat_kind> !callback_payload
// Outbound messages are printed to stdout.

use anyhow::{bail, Context, Result};
use couple_ledger::{
    init_logging, open_database, Bot, ChatKind, Config, InboundCallback, InboundCommand,
    OutboundMessage, SystemClock, VERSION,
};
use std::fs;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

#[derive(Debug, PartialEq)]
enum Inbound {
    Command(InboundCommand),
    Callback(InboundCallback),
}

fn parse_line(line: &str) -> Result<Inbound> {
    let mut fields = line.split_whitespace();

    let user_id: i64 = fields
        .next()
        .context("missing user id")?
        .parse()
        .context("user id must be a number")?;
    let chat_id: i64 = fields
        .next()
        .context("missing chat id")?
        .parse()
        .context("chat id must be a number")?;
    let chat_kind: ChatKind = fields.next().context("missing chat kind")?.parse()?;
    let event = fields.next().context("missing /command or !payload")?;
    let args = fields.collect::<Vec<_>>().join(" ");

    if let Some(payload) = event.strip_prefix('!') {
        return Ok(Inbound::Callback(InboundCallback {
            user_id,
            display_name: None,
            chat_id,
            chat_kind,
            payload: payload.to_string(),
        }));
    }
    if !event.starts_with('/') {
        bail!("expected /command or !payload, got '{}'", event);
    }

    Ok(Inbound::Command(InboundCommand {
        user_id,
        username: None,
        display_name: None,
        chat_id,
        chat_kind,
        command: event.to_string(),
        args,
    }))
}

fn print_messages(out: &mut impl Write, messages: &[OutboundMessage]) -> io::Result<()> {
    for message in messages {
        writeln!(out, "── chat {} ──", message.chat_id)?;
        writeln!(out, "{}", message.text)?;
        for option in &message.options {
            writeln!(out, "   [{}] !{}", option.label, option.payload)?;
        }
    }
    out.flush()
}

fn main() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_logging(&config.log_level);

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
    }
    let conn = open_database(&config.db_path)
        .with_context(|| format!("cannot open database {}", config.db_path.display()))?;
    let bot = Bot::new(conn, Box::new(SystemClock), config.default_language);

    println!("💑 Couple Ledger v{} - console mode", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Format: <user_id> <chat_id> <private|group|supergroup|channel> /command args");
    println!("        <user_id> <chat_id> <chat_kind> !callback_payload\n");
    info!(db = %config.db_path.display(), "console transport ready");

    let stdin = io::stdin();
    let mut out = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let replies = match parse_line(trimmed) {
            Ok(Inbound::Command(command)) => bot.handle_command(&command),
            Ok(Inbound::Callback(callback)) => bot.handle_callback(&callback),
            Err(err) => {
                warn!(error = %err, "malformed input line");
                writeln!(out, "❌ {:#}", err)?;
                continue;
            }
        };
        print_messages(&mut out, &replies)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let parsed = parse_line("100 -55 group /add 25.50  Dinner Food").unwrap();
        match parsed {
            Inbound::Command(command) => {
                assert_eq!(command.user_id, 100);
                assert_eq!(command.chat_id, -55);
                assert_eq!(command.chat_kind, ChatKind::Group);
                assert_eq!(command.command, "/add");
                assert_eq!(command.args, "25.50 Dinner Food");
            }
            other => panic!("expected a command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_callback_line() {
        let parsed = parse_line("7 7 private !lang_es_AR").unwrap();
        assert!(matches!(parsed, Inbound::Callback(cb) if cb.payload == "lang_es_AR"));
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(parse_line("abc 1 private /start").is_err());
        assert!(parse_line("1 1 forum /start").is_err());
        assert!(parse_line("1 1 private start").is_err());
        assert!(parse_line("1 1 private").is_err());
    }

    #[test]
    fn test_print_messages_lists_options() {
        let mut buffer = Vec::new();
        let message = OutboundMessage {
            chat_id: 3,
            text: "pick".to_string(),
            options: vec![couple_ledger::ReplyOption {
                label: "English".to_string(),
                payload: "lang_en".to_string(),
            }],
        };
        print_messages(&mut buffer, &[message]).unwrap();
        let printed = String::from_utf8(buffer).unwrap();
        assert!(printed.contains("pick"));
        assert!(printed.contains("[English] !lang_en"));
    }
}
