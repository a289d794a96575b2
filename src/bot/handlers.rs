//! Command handlers.
//!
//! Everything here is a thin reply layer: the dispatch chain has already
//! vetted the event, and the heavy lifting is delegated to the moderation
//! coordinator. Replies go through the teloxide [`Bot`] directly so they
//! can use HTML mode and inline keyboards.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode,
};
use tracing::{info, warn};

use super::commands::Command;
use super::mentions;
use super::App;
use crate::dispatch::{CallbackEvent, MessageEvent, ReplyRef};
use crate::moderation::{count_failures, ModerationAction, ModerationOutcome, MuteDuration};

const MUTE_GUIDE: &str = "I could not read that mute duration.\n\n\
    Usage: <code>!mute [amount][unit]</code>\n\
    Examples: <code>!mute 5m</code>, <code>!mute 1h</code>, \
    <code>!mute 1d</code>, <code>!mute 1w</code>";

const HELP_TEXT: &str = "Moderation commands (reply to a message):\n\
    /mute [duration] - restrict the author\n\
    /unmute - lift a restriction\n\
    /ban, /unban - ban or unban in this chat\n\
    /black - block the author in every managed chat\n\
    /unblack &lt;id&gt; - unblock by user id\n\
    /blacklist - list blocked users\n\
    /report - forward the message to the moderators";

/// Route one surviving message event to its command handler.
pub async fn handle_command(
    bot: &Bot,
    app: &App,
    message: &MessageEvent,
    command: Command,
) -> Result<()> {
    match command {
        Command::Start => {
            reply(bot, message, "I keep order here. See /help for commands.").await
        }
        Command::Help => reply(bot, message, HELP_TEXT).await,
        Command::Report => report(bot, app, message).await,
        Command::Blacklist => blacklist(bot, app, message).await,
        // Everything below acts on other users and needs moderator rights.
        moderation_command => {
            if !message.chat.is_multi_user() {
                return reply(bot, message, "Moderation commands only work in group chats.").await;
            }
            if !app.is_moderator(message.chat.id, message.author.id).await {
                return reply(bot, message, "You are not allowed to do that.").await;
            }
            match moderation_command {
                Command::Mute(duration) => mute(bot, app, message, duration).await,
                Command::Unmute => single_chat_action(bot, app, message, ModerationAction::Unmute)
                    .await,
                Command::Ban => {
                    single_chat_action(
                        bot,
                        app,
                        message,
                        ModerationAction::Ban {
                            revoke_history: false,
                        },
                    )
                    .await
                }
                Command::Unban => {
                    single_chat_action(bot, app, message, ModerationAction::Unban).await
                }
                Command::Black => black(bot, message).await,
                Command::Unblack(user_id) => unblack(bot, app, message, user_id).await,
                _ => Ok(()),
            }
        }
    }
}

/// Resolve a pressed inline button.
pub async fn handle_callback(bot: &Bot, app: &App, callback: &CallbackEvent) -> Result<()> {
    let Some(data) = callback.data.as_deref() else {
        return Ok(());
    };
    let Some(chat) = callback.chat else {
        return Ok(());
    };
    let Some(keyboard_message_id) = callback.message_id else {
        return Ok(());
    };

    if data == "bl:no" {
        bot.edit_message_text(
            ChatId(chat.id),
            MessageId(keyboard_message_id),
            "Action cancelled.",
        )
        .await?;
        return Ok(());
    }

    let Some(target) = parse_confirm_data(data) else {
        return Ok(());
    };

    if !app.is_moderator(chat.id, callback.author.id).await {
        return Ok(());
    }

    app.blocklist.block(target.user_id).await?;

    // Ban in the originating chat and drop the offending message first so
    // the room is clean even if the fan-out drags on.
    if let Err(err) = app.gateway.ban_member(chat.id, target.user_id, false).await {
        warn!(chat_id = chat.id, "Failed to ban in originating chat: {err}");
    }
    if let Err(err) = app.gateway.delete_message(chat.id, target.message_id).await {
        warn!(chat_id = chat.id, "Failed to delete reported message: {err}");
    }

    let outcomes = app
        .coordinator
        .apply_globally(
            &ModerationAction::Ban {
                revoke_history: true,
            },
            target.user_id,
        )
        .await?;

    info!(
        user_id = target.user_id,
        chats = outcomes.len(),
        failures = count_failures(&outcomes),
        "User block-listed"
    );

    bot.edit_message_text(
        ChatId(chat.id),
        MessageId(keyboard_message_id),
        format!(
            "User <code>{}</code> added to the black list.\n\n{}",
            target.user_id,
            outcome_report(&outcomes)
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

struct ConfirmTarget {
    user_id: i64,
    message_id: i32,
}

fn parse_confirm_data(data: &str) -> Option<ConfirmTarget> {
    let mut parts = data.split(':');
    if parts.next() != Some("bl") || parts.next() != Some("yes") {
        return None;
    }
    Some(ConfirmTarget {
        user_id: parts.next()?.parse().ok()?,
        message_id: parts.next()?.parse().ok()?,
    })
}

/// Per-chat success/failure report shown after a fan-out.
fn outcome_report(outcomes: &[ModerationOutcome]) -> String {
    if outcomes.is_empty() {
        return "No managed chats on record.".to_string();
    }

    let failures = count_failures(outcomes);
    let mut report = format!(
        "Applied in {} of {} chats.",
        outcomes.len() - failures,
        outcomes.len()
    );
    for outcome in outcomes {
        let line = match &outcome.result {
            Ok(()) => format!("\nchat {}: ok", outcome.chat_id),
            Err(err) => format!("\nchat {}: {err}", outcome.chat_id),
        };
        report.push_str(&line);
    }
    report
}

async fn reply(bot: &Bot, message: &MessageEvent, text: &str) -> Result<()> {
    bot.send_message(ChatId(message.chat.id), text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// The replied-to message, or `None` after telling the invoker what to do.
async fn require_reply<'a>(
    bot: &Bot,
    message: &'a MessageEvent,
    action: &str,
) -> Result<Option<&'a ReplyRef>> {
    match &message.reply_to {
        Some(target) => Ok(Some(target)),
        None => {
            reply(
                bot,
                message,
                &format!("Reply to a message from the user you want to {action}."),
            )
            .await?;
            Ok(None)
        }
    }
}

async fn mute(
    bot: &Bot,
    app: &App,
    message: &MessageEvent,
    duration: Option<MuteDuration>,
) -> Result<()> {
    let Some(duration) = duration else {
        return reply(bot, message, MUTE_GUIDE).await;
    };
    let Some(target) = require_reply(bot, message, "mute").await? else {
        return Ok(());
    };

    let outcome = app
        .coordinator
        .apply(
            &ModerationAction::Mute(duration),
            target.author.id,
            message.chat.id,
        )
        .await;

    let text = match &outcome.result {
        Ok(()) => format!(
            "{} is muted for {duration}.",
            mentions::mention(&target.author)
        ),
        Err(err) => format!("Something went wrong:\n\n{}", mentions::escaped(&err.to_string())),
    };
    reply(bot, message, &text).await
}

async fn single_chat_action(
    bot: &Bot,
    app: &App,
    message: &MessageEvent,
    action: ModerationAction,
) -> Result<()> {
    let verb = action.kind().to_string();
    let Some(target) = require_reply(bot, message, &verb).await? else {
        return Ok(());
    };

    let outcome = app
        .coordinator
        .apply(&action, target.author.id, message.chat.id)
        .await;

    let text = match &outcome.result {
        Ok(()) => format!(
            "Done: {verb} applied to {}.",
            mentions::mention(&target.author)
        ),
        Err(err) => format!("Something went wrong:\n\n{}", mentions::escaped(&err.to_string())),
    };
    reply(bot, message, &text).await
}

async fn black(bot: &Bot, message: &MessageEvent) -> Result<()> {
    let Some(target) = require_reply(bot, message, "block everywhere").await? else {
        return Ok(());
    };

    let keyboard = InlineKeyboardMarkup::new([[
        InlineKeyboardButton::callback(
            "Yes",
            format!("bl:yes:{}:{}", target.author.id, target.message_id),
        ),
        InlineKeyboardButton::callback("No", "bl:no".to_string()),
    ]]);

    bot.send_message(
        ChatId(message.chat.id),
        format!(
            "Block {} in every managed chat and wipe their messages here?",
            mentions::mention(&target.author)
        ),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(keyboard)
    .await?;
    Ok(())
}

async fn unblack(
    bot: &Bot,
    app: &App,
    message: &MessageEvent,
    user_id: Option<i64>,
) -> Result<()> {
    let Some(user_id) = user_id else {
        return reply(bot, message, "Usage: <code>/unblack [user id]</code>").await;
    };

    app.blocklist.unblock(user_id).await?;
    let outcomes = app
        .coordinator
        .apply_globally(&ModerationAction::Unban, user_id)
        .await?;

    reply(
        bot,
        message,
        &format!(
            "User <code>{user_id}</code> removed from the black list.\n\n{}",
            outcome_report(&outcomes)
        ),
    )
    .await
}

async fn blacklist(bot: &Bot, app: &App, message: &MessageEvent) -> Result<()> {
    let mut entries = app.blocklist.blocked_users().await?;
    if entries.is_empty() {
        return reply(bot, message, "The black list is empty.").await;
    }
    entries.sort_unstable_by_key(|entry| entry.blocked_at);

    let mut text = format!("{} blocked user(s):", entries.len());
    for entry in entries {
        text.push_str(&format!(
            "\n<code>{}</code> since {}",
            entry.user_id,
            entry.blocked_at.format("%Y-%m-%d")
        ));
    }
    reply(bot, message, &text).await
}

async fn report(bot: &Bot, app: &App, message: &MessageEvent) -> Result<()> {
    let Some(report_chat_id) = app.report_chat_id else {
        return reply(bot, message, "Reporting is not configured.").await;
    };
    let Some(target) = require_reply(bot, message, "report").await? else {
        return Ok(());
    };

    let text = format!(
        "🚨 <b>From:</b> {}\n🎯 <b>About:</b> {}\n💬 <b>Chat:</b> <code>{}</code>\n\n📝 {}",
        mentions::mention(&message.author),
        mentions::mention(&target.author),
        message.chat.id,
        mentions::escaped(target.text.as_deref().unwrap_or("(no text)")),
    );

    bot.send_message(ChatId(report_chat_id), text)
        .parse_mode(ParseMode::Html)
        .await?;
    reply(bot, message, "Report sent. Thank you.").await
}
