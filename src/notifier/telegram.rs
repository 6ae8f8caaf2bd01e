//! Telegram delivery of notifications.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use super::message::ReplyAction;
use super::Messenger;

/// Sends notifications through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_notification(
        &self,
        chat_id: i64,
        text: &str,
        actions: &[ReplyAction],
    ) -> Result<()> {
        let row: Vec<InlineKeyboardButton> = actions
            .iter()
            .map(|action| InlineKeyboardButton::callback(action.label.clone(), action.data.clone()))
            .collect();

        self.bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(InlineKeyboardMarkup::new([row]))
            .await?;

        Ok(())
    }
}
