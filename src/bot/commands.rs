//! Moderation command grammar.
//!
//! Commands are accepted with either a `/` or `!` prefix, as group
//! moderators habitually type both. Mute durations follow the
//! `[amount][m|h|d|w]` grammar with a 5-minute default.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::DEFAULT_MUTE_MINUTES;
use crate::moderation::{MuteDuration, MuteUnit};

/// A recognized command with its parsed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `None` means the duration text was present but invalid; the handler
    /// answers with the usage guide instead of guessing.
    Mute(Option<MuteDuration>),
    Unmute,
    Ban,
    Unban,
    /// Block the replied-to user everywhere (asks for confirmation).
    Black,
    /// Unblock by explicit id: `/unblack 123456`.
    Unblack(Option<i64>),
    /// List currently blocked users.
    Blacklist,
    Report,
}

fn mute_args_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+)\s*([mhdw])?)?$").expect("mute grammar regex is valid")
    })
}

fn parse_mute_args(args: &str) -> Option<MuteDuration> {
    let captures = mute_args_regex().captures(args.trim())?;

    let amount = captures
        .get(1)
        .map_or(Ok(DEFAULT_MUTE_MINUTES), |m| m.as_str().parse::<u32>())
        .ok()?;

    let unit = match captures.get(2).map(|m| m.as_str()) {
        None | Some("m") => MuteUnit::Minutes,
        Some("h") => MuteUnit::Hours,
        Some("d") => MuteUnit::Days,
        Some("w") => MuteUnit::Weeks,
        Some(_) => return None,
    };

    MuteDuration::new(amount, unit).ok()
}

/// Parse a message text into a command.
///
/// Returns `None` for anything that is not a command addressed to us. Bot
/// mentions in the command word (`/ban@warden_bot`) are ignored.
#[must_use]
pub fn parse(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    let rest = trimmed
        .strip_prefix('/')
        .or_else(|| trimmed.strip_prefix('!'))?;

    let (word, args) = match rest.split_once(char::is_whitespace) {
        Some((word, args)) => (word, args.trim()),
        None => (rest, ""),
    };
    let word = word.split('@').next().unwrap_or(word);

    let command = match word {
        "start" => Command::Start,
        "help" => Command::Help,
        "mute" => Command::Mute(parse_mute_args(args)),
        "unmute" => Command::Unmute,
        "ban" => Command::Ban,
        "unban" => Command::Unban,
        "black" => Command::Black,
        "unblack" => Command::Unblack(args.split_whitespace().next().and_then(|id| id.parse().ok())),
        "blacklist" => Command::Blacklist,
        "report" => Command::Report,
        _ => return None,
    };
    Some(command)
}
