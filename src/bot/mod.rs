//! Telegram edge of the service.
//!
//! Converts teloxide updates into domain [`Event`]s, runs them through the
//! dispatch chain, and routes survivors to command handlers. Teloxide's
//! dispatcher already gives every update its own task, so the chain for one
//! event runs sequentially while events from different chats proceed in
//! parallel.

pub mod commands;
pub mod handlers;
pub mod mentions;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Chat, ChatMemberUpdated, User};
use tracing::{debug, error};

use crate::config::{
    Settings, ADMIN_CACHE_MAX_CAPACITY, ADMIN_CACHE_TTL_SECS, GATEWAY_CALL_TIMEOUT_SECS,
};
use crate::dispatch::{
    Author, CallbackEvent, ChatKind, ChatRef, DispatchContext, Dispatcher, Event, MembershipEvent,
    MembershipUpdate, MessageEvent, ReplyRef,
};
use crate::dispatch::stages::{BlacklistStage, HistoryStage, MembershipGuardStage};
use crate::gateway::{PlatformGateway, TelegramGateway};
use crate::membership::AdminCache;
use crate::moderation::ModerationCoordinator;
use crate::store::{
    BlockListStore, HistoryStore, InMemoryBlockList, InMemoryHistory, InMemoryManagedChats,
    ManagedChatStore,
};

/// Shared service state handed to every update handler.
pub struct App {
    pub gateway: Arc<dyn PlatformGateway>,
    pub admins: Arc<AdminCache>,
    pub blocklist: Arc<dyn BlockListStore>,
    pub chats: Arc<dyn ManagedChatStore>,
    pub history: Arc<dyn HistoryStore>,
    pub coordinator: ModerationCoordinator,
    pub dispatcher: Dispatcher,
    pub operators: Arc<HashSet<i64>>,
    pub report_chat_id: Option<i64>,
}

impl App {
    /// Wire the full pipeline over a Telegram gateway.
    ///
    /// Stage order is part of the contract: blacklist enforcement first, so
    /// a blocked user is never recorded or answered; the membership guard
    /// next, so unmanaged chats are never persisted; history last.
    #[must_use]
    pub fn build(bot: Bot, settings: &Settings) -> Arc<Self> {
        let gateway: Arc<dyn PlatformGateway> = Arc::new(TelegramGateway::new(bot));
        let admins = Arc::new(AdminCache::new(
            gateway.clone(),
            Duration::from_secs(ADMIN_CACHE_TTL_SECS),
            ADMIN_CACHE_MAX_CAPACITY,
        ));
        let blocklist: Arc<dyn BlockListStore> = Arc::new(InMemoryBlockList::new());
        let chats: Arc<dyn ManagedChatStore> = Arc::new(InMemoryManagedChats::new());
        let history: Arc<dyn HistoryStore> = Arc::new(InMemoryHistory::new());
        let operators = Arc::new(settings.trusted_operators());

        let context = DispatchContext {
            gateway: gateway.clone(),
            admins: admins.clone(),
            blocklist: blocklist.clone(),
            chats: chats.clone(),
            history: history.clone(),
            operators: operators.clone(),
        };

        let mut dispatcher = Dispatcher::new(context);
        dispatcher.register(Box::new(BlacklistStage));
        dispatcher.register(Box::new(MembershipGuardStage));
        dispatcher.register(Box::new(HistoryStage));

        let coordinator = ModerationCoordinator::new(
            gateway.clone(),
            chats.clone(),
            Duration::from_secs(GATEWAY_CALL_TIMEOUT_SECS),
        );

        Arc::new(Self {
            gateway,
            admins,
            blocklist,
            chats,
            history,
            coordinator,
            dispatcher,
            operators,
            report_chat_id: settings.report_chat_id,
        })
    }

    /// Whether a user may issue moderation commands in a chat: trusted
    /// operators always, chat administrators via the cache. An admin lookup
    /// failure denies rather than guesses.
    pub async fn is_moderator(&self, chat_id: i64, user_id: i64) -> bool {
        if self.operators.contains(&user_id) {
            return true;
        }
        match self.admins.get_admins(chat_id).await {
            Ok(admins) => admins.contains(&user_id),
            Err(err) => {
                error!(chat_id, user_id, "Admin lookup failed, denying: {err}");
                false
            }
        }
    }
}

fn chat_ref(chat: &Chat) -> ChatRef {
    let kind = if chat.is_private() {
        ChatKind::Private
    } else if chat.is_group() {
        ChatKind::Group
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Channel
    };
    ChatRef {
        id: chat.id.0,
        kind,
    }
}

fn author_of(user: &User) -> Author {
    Author {
        id: user.id.0.cast_signed(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

/// Messages without a sender (channel posts, service messages) carry
/// nothing to moderate and are skipped.
fn message_event(msg: &Message) -> Option<MessageEvent> {
    let from = msg.from.as_ref()?;
    let reply_to = msg.reply_to_message().and_then(|replied| {
        replied.from.as_ref().map(|author| ReplyRef {
            message_id: replied.id.0,
            author: author_of(author),
            text: replied.text().map(str::to_string),
        })
    });

    Some(MessageEvent {
        chat: chat_ref(&msg.chat),
        author: author_of(from),
        message_id: msg.id.0,
        text: msg.text().map(str::to_string),
        reply_to,
    })
}

fn membership_event(update: &ChatMemberUpdated) -> Option<MembershipEvent> {
    let was_present = update.old_chat_member.is_present();
    let is_present = update.new_chat_member.is_present();
    let change = match (was_present, is_present) {
        (false, true) => MembershipUpdate::Joined,
        (true, false) => MembershipUpdate::Left,
        _ => return None,
    };

    Some(MembershipEvent {
        chat: chat_ref(&update.chat),
        user: author_of(&update.new_chat_member.user),
        update: change,
    })
}

fn callback_event(query: &CallbackQuery) -> CallbackEvent {
    CallbackEvent {
        chat: query.message.as_ref().map(|msg| chat_ref(msg.chat())),
        author: author_of(&query.from),
        data: query.data.clone(),
        message_id: query.message.as_ref().map(|msg| msg.id().0),
    }
}

/// Run one domain event through the chain; true if it survived every stage.
async fn dispatch_event(app: &App, event: &Event) -> bool {
    match app.dispatcher.dispatch(event).await {
        Ok(outcome) => outcome.survived(),
        Err(err) => {
            error!("Dispatch failed: {err}");
            false
        }
    }
}

async fn on_message(bot: Bot, msg: Message, app: Arc<App>) -> Result<(), teloxide::RequestError> {
    let Some(event) = message_event(&msg) else {
        return respond(());
    };

    if dispatch_event(&app, &Event::Message(event.clone())).await {
        if let Some(command) = event.text.as_deref().and_then(commands::parse) {
            if let Err(err) = handlers::handle_command(&bot, &app, &event, command).await {
                error!("Command handler error: {err}");
            }
        }
    }
    respond(())
}

async fn on_chat_member(
    _bot: Bot,
    update: ChatMemberUpdated,
    app: Arc<App>,
) -> Result<(), teloxide::RequestError> {
    let Some(event) = membership_event(&update) else {
        return respond(());
    };

    // No greeting flow yet; the chain still runs so guards and history see
    // joins and leaves.
    if dispatch_event(&app, &Event::MembershipChange(event.clone())).await {
        debug!(
            chat_id = event.chat.id,
            user_id = event.user.id,
            update = ?event.update,
            "Membership change observed"
        );
    }
    respond(())
}

async fn on_callback_query(
    bot: Bot,
    query: CallbackQuery,
    app: Arc<App>,
) -> Result<(), teloxide::RequestError> {
    let event = callback_event(&query);

    // Ack early so the client stops its spinner regardless of outcome.
    if let Err(err) = bot.answer_callback_query(query.id.clone()).await {
        debug!("Failed to answer callback query: {err}");
    }

    if dispatch_event(&app, &Event::CallbackQuery(event.clone())).await {
        if let Err(err) = handlers::handle_callback(&bot, &app, &event).await {
            error!("Callback handler error: {err}");
        }
    }
    respond(())
}

/// Update routing tree handed to the teloxide dispatcher.
#[must_use]
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_chat_member().endpoint(on_chat_member))
        .branch(Update::filter_callback_query().endpoint(on_callback_query))
}
