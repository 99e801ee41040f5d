//! Embed builders for every message the bot sends.

use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use pepito_relay::Notification;

const FOOTER: &str = "Pépito Notification System";

const BLUE: u32 = 0x3498DB;
const GREEN: u32 = 0x2ECC71;
const ORANGE: u32 = 0xE67E22;

/// Door-event notification: title plus the snapshot image.
pub fn event_embed(note: &Notification) -> CreateEmbed {
    CreateEmbed::new()
        .title(&note.title)
        .colour(BLUE)
        .image(&note.image_url)
        .footer(CreateEmbedFooter::new(FOOTER))
}

/// Greeting sent when the bot joins a new guild.
pub fn welcome_embed(guild_name: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("Hello! Thank you for adding me to {guild_name}"))
        .description(
            "To get started, please use the `/setchannel` command to set a channel \
             for Pépito notifications.",
        )
        .colour(GREEN)
        .footer(CreateEmbedFooter::new(FOOTER))
}

/// Ephemeral confirmation for a successful `/setchannel`.
pub fn setchannel_embed(channel_mention: &str, guild_name: &str, channel_id: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("Channel Set Successfully")
        .description(format!(
            "The channel {channel_mention} has been set for Pépito notifications!"
        ))
        .colour(GREEN)
        .field("Server Name", guild_name, false)
        .field("Channel ID", channel_id, false)
}

/// Daily nag for guilds without a configured channel, addressed to the owner.
pub fn reminder_embed(owner_id: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("Pépito Reminder")
        .description(format!(
            "Hello <@{owner_id}>, it seems you haven't set a notification channel \
             for Pépito yet! Please use the `/setchannel` command to configure one."
        ))
        .colour(ORANGE)
}

/// Developer-initiated broadcast to every configured channel.
pub fn announcement_embed(message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("This is a global announcement from Pépito! \u{1F408}")
        .description(message)
        .colour(BLUE)
}
