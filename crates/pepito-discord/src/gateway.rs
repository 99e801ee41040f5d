use std::sync::Arc;

use serenity::async_trait;
use serenity::builder::CreateMessage;
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::channel::ChannelType;
use serenity::model::id::{ChannelId, GuildId};
use serenity::model::permissions::Permissions;

use pepito_relay::{ChatGateway, DeliveryError, Notification, ServerInfo};

use crate::embed;

/// [`ChatGateway`] over serenity's REST client and gateway cache.
///
/// `Http` is plain REST and the cache is fed by the gateway connection, so
/// both handles stay valid across gateway reconnects.
pub struct SerenityGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    /// Cache-resolve a channel id, mirroring the "channel no longer
    /// resolvable" failure mode distinctly from a failed send.
    fn resolve_channel(&self, channel_id: &str) -> Result<ChannelId, DeliveryError> {
        let id = parse_id(channel_id).ok_or_else(|| DeliveryError::ChannelNotFound {
            channel_id: channel_id.to_string(),
        })?;
        let id = ChannelId::new(id);
        if self.cache.channel(id).is_none() {
            return Err(DeliveryError::ChannelNotFound {
                channel_id: channel_id.to_string(),
            });
        }
        Ok(id)
    }

    async fn send_embed(
        &self,
        channel_id: &str,
        message: CreateMessage,
    ) -> Result<(), DeliveryError> {
        let id = self.resolve_channel(channel_id)?;
        id.send_message(&self.http, message)
            .await
            .map_err(|e| DeliveryError::Send {
                channel_id: channel_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl ChatGateway for SerenityGateway {
    async fn send_notification(
        &self,
        channel_id: &str,
        note: &Notification,
    ) -> Result<(), DeliveryError> {
        let message = CreateMessage::new().embed(embed::event_embed(note));
        self.send_embed(channel_id, message).await
    }

    async fn send_reminder(
        &self,
        channel_id: &str,
        server: &ServerInfo,
    ) -> Result<(), DeliveryError> {
        let message = CreateMessage::new().embed(embed::reminder_embed(&server.owner_id));
        self.send_embed(channel_id, message).await
    }

    fn joined_servers(&self) -> Vec<ServerInfo> {
        self.cache
            .guilds()
            .into_iter()
            .filter_map(|gid| {
                let guild = self.cache.guild(gid)?;
                Some(ServerInfo {
                    id: gid.to_string(),
                    name: guild.name.clone(),
                    owner_id: guild.owner_id.to_string(),
                })
            })
            .collect()
    }

    fn channels_in(&self, server_id: &str) -> Vec<String> {
        let Some(gid) = parse_id(server_id) else {
            return Vec::new();
        };
        let Some(guild) = self.cache.guild(GuildId::new(gid)) else {
            return Vec::new();
        };
        let mut channels: Vec<_> = guild
            .channels
            .values()
            .filter(|c| c.kind == ChannelType::Text)
            .collect();
        channels.sort_by_key(|c| (c.position, c.id));
        channels.into_iter().map(|c| c.id.to_string()).collect()
    }

    fn can_send_in(&self, server_id: &str, channel_id: &str) -> bool {
        let (Some(gid), Some(cid)) = (parse_id(server_id), parse_id(channel_id)) else {
            return false;
        };
        let bot_id = self.cache.current_user().id;
        let Some(guild) = self.cache.guild(GuildId::new(gid)) else {
            return false;
        };
        let Some(channel) = guild.channels.get(&ChannelId::new(cid)) else {
            return false;
        };
        let Some(me) = guild.members.get(&bot_id) else {
            return false;
        };
        guild
            .user_permissions_in(channel, me)
            .contains(Permissions::SEND_MESSAGES)
    }
}

/// Parse an opaque id string into serenity's non-zero id space.
pub(crate) fn parse_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_non_numeric_and_zero() {
        assert_eq!(parse_id("1087917"), Some(1_087_917));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-5"), None);
    }
}
