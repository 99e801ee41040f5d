use std::sync::Arc;

use serenity::all::ActivityData;
use serenity::async_trait;
use serenity::builder::CreateMessage;
use serenity::model::application::Interaction;
use serenity::model::channel::{ChannelType, GuildChannel};
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, UnavailableGuild};
use serenity::model::id::{ChannelId, UserId};
use serenity::model::user::OnlineStatus;
use serenity::prelude::{Context, EventHandler};
use tokio::sync::watch;
use tracing::{info, warn};

use pepito_store::ChannelDirectory;

use crate::embed;

/// Serenity event handler: keeps the channel directory reconciled with the
/// bot's live membership and serves the slash commands.
pub struct PepitoHandler {
    pub directory: Arc<ChannelDirectory>,
    pub developer_guild_id: Option<u64>,
    /// Flipped once the gateway is connected; gates the first reminder sweep.
    pub ready_tx: Arc<watch::Sender<bool>>,
}

#[async_trait]
impl EventHandler for PepitoHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        ctx.set_presence(
            Some(ActivityData::playing("/setchannel to get started")),
            OnlineStatus::Online,
        );
        info!(name = %ready.user.name, "Discord bot connected");

        crate::commands::register_commands(&ctx).await;

        let _ = self.ready_tx.send(true);
    }

    /// Fires once per joined guild after connect and again on every new
    /// join: the reconciliation point that guarantees a directory entry
    /// (unconfigured at first) for every current member guild.
    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        if let Err(e) = self.directory.ensure(&guild.id.to_string(), &guild.name) {
            warn!(guild_id = %guild.id, error = %e, "failed to record guild in directory");
        }

        if is_new == Some(true) {
            info!(guild_id = %guild.id, guild = %guild.name, "joined new guild");
            self.welcome(&ctx, &guild).await;
        }
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        // Also fires when a guild merely goes unavailable during an outage;
        // only a real removal drops the entry.
        if incomplete.unavailable {
            return;
        }
        match self.directory.remove(&incomplete.id.to_string()) {
            Ok(true) => info!(guild_id = %incomplete.id, "guild removed from directory"),
            Ok(false) => {}
            Err(e) => {
                warn!(guild_id = %incomplete.id, error = %e, "failed to remove guild from directory")
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            crate::commands::handle_interaction(self, &ctx, &command).await;
        }
    }
}

impl PepitoHandler {
    async fn welcome(&self, ctx: &Context, guild: &Guild) {
        let bot_id = ctx.cache.current_user().id;
        let Some(channel_id) = pick_welcome_channel(guild, bot_id) else {
            warn!(guild_id = %guild.id, guild = %guild.name, "no channel available for welcome message");
            return;
        };

        let message = CreateMessage::new().embed(embed::welcome_embed(&guild.name));
        if let Err(e) = channel_id.send_message(&ctx.http, message).await {
            warn!(guild_id = %guild.id, guild = %guild.name, error = %e, "failed to send welcome message");
        }
    }
}

/// The system channel when the bot can post there, otherwise the first text
/// channel with send permission. Permission checks degrade to "assume
/// sendable" when the bot's own member is not in the guild payload.
fn pick_welcome_channel(guild: &Guild, bot_id: UserId) -> Option<ChannelId> {
    let can_send = |channel: &GuildChannel| match guild.members.get(&bot_id) {
        Some(me) => guild
            .user_permissions_in(channel, me)
            .contains(serenity::model::permissions::Permissions::SEND_MESSAGES),
        None => true,
    };

    if let Some(system) = guild.system_channel_id {
        if let Some(channel) = guild.channels.get(&system) {
            if can_send(channel) {
                return Some(system);
            }
        }
    }

    let mut text: Vec<_> = guild
        .channels
        .values()
        .filter(|c| c.kind == ChannelType::Text)
        .collect();
    text.sort_by_key(|c| (c.position, c.id));
    text.into_iter().find(|c| can_send(c)).map(|c| c.id)
}
