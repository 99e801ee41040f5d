//! Discord slash commands — `/setchannel`, `/announce`.
//!
//! Registration happens in `ready()`; interactions are dispatched from
//! `interaction_create` in the event handler.

use serenity::builder::{
    CreateCommand, CreateCommandOption, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse,
};
use serenity::model::application::{CommandInteraction, CommandOptionType};
use serenity::model::id::ChannelId;
use serenity::prelude::Context;
use tracing::{info, warn};

use crate::embed;
use crate::gateway::parse_id;
use crate::handler::PepitoHandler;

/// Register global slash commands. Call from `ready()`.
pub async fn register_commands(ctx: &Context) {
    let commands = vec![
        CreateCommand::new("setchannel")
            .description("Set the channel for Pépito notifications")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "channel",
                    "The channel where notifications will be sent",
                )
                .required(true),
            ),
        CreateCommand::new("announce")
            .description("Send a global announcement to all servers")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "message", "Announcement text")
                    .required(true),
            ),
    ];

    match serenity::model::application::Command::set_global_commands(&ctx.http, commands).await {
        Ok(cmds) => info!(count = cmds.len(), "registered global slash commands"),
        Err(e) => warn!(error = %e, "failed to register global slash commands"),
    }
}

/// Dispatch a slash command interaction to the appropriate handler.
pub async fn handle_interaction(
    handler: &PepitoHandler,
    ctx: &Context,
    command: &CommandInteraction,
) {
    let result = match command.data.name.as_str() {
        "setchannel" => handle_setchannel(handler, ctx, command).await,
        "announce" => handle_announce(handler, ctx, command).await,
        _ => {
            respond_ephemeral(ctx, command, "Unknown command.").await;
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!(command = %command.data.name, error = %e, "slash command error");
    }
}

/// `/setchannel channel:Channel` sets where notifications land.
async fn handle_setchannel(
    handler: &PepitoHandler,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    let Some(guild_id) = command.guild_id else {
        respond_ephemeral(ctx, command, "This command can only be used in a server.").await;
        return Ok(());
    };

    let channel_id = command
        .data
        .options
        .iter()
        .find(|o| o.name == "channel")
        .and_then(|o| o.value.as_channel_id());
    let Some(channel_id) = channel_id else {
        respond_ephemeral(ctx, command, "Please provide a channel.").await;
        return Ok(());
    };

    let guild_name = ctx
        .cache
        .guild(guild_id)
        .map(|g| g.name.clone())
        .unwrap_or_default();

    match handler.directory.set_channel(
        &guild_id.to_string(),
        &guild_name,
        &channel_id.to_string(),
    ) {
        Ok(()) => {
            info!(guild_id = %guild_id, channel_id = %channel_id, "notification channel configured");
            let embed = embed::setchannel_embed(
                &format!("<#{channel_id}>"),
                &guild_name,
                &channel_id.to_string(),
            );
            command
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .embed(embed)
                            .ephemeral(true),
                    ),
                )
                .await?;
        }
        Err(e) => {
            warn!(guild_id = %guild_id, error = %e, "setchannel persist failed");
            respond_ephemeral(
                ctx,
                command,
                "Could not save the channel configuration. Please try again.",
            )
            .await;
        }
    }
    Ok(())
}

/// `/announce message:String` broadcasts to every configured channel.
/// Restricted to the developer guild.
async fn handle_announce(
    handler: &PepitoHandler,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    let in_developer_guild = handler.developer_guild_id.is_some()
        && command.guild_id.map(|g| g.get()) == handler.developer_guild_id;
    if !in_developer_guild {
        respond_ephemeral(
            ctx,
            command,
            "This command can only be used in the developer server.",
        )
        .await;
        return Ok(());
    }

    let message = command
        .data
        .options
        .iter()
        .find(|o| o.name == "message")
        .and_then(|o| o.value.as_str())
        .unwrap_or("");
    if message.is_empty() {
        respond_ephemeral(ctx, command, "Please provide a message.").await;
        return Ok(());
    }

    // Delivery to many guilds can outlast the 3-second interaction window,
    // so defer now and edit the response with the outcome.
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(
                CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let snapshot = match handler.directory.snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "announce: channel directory unreadable");
            command
                .edit_response(
                    &ctx.http,
                    EditInteractionResponse::new().content("Could not load the channel directory."),
                )
                .await?;
            return Ok(());
        }
    };

    let embed = embed::announcement_embed(message);
    let mut failed: Vec<String> = Vec::new();
    for (guild_id, dest) in &snapshot {
        let Some(channel_id) = dest.channel_id.as_deref() else {
            continue;
        };
        let delivered = match parse_id(channel_id) {
            Some(raw) => ChannelId::new(raw)
                .send_message(&ctx.http, CreateMessage::new().embed(embed.clone()))
                .await
                .is_ok(),
            None => false,
        };
        if !delivered {
            warn!(guild_id = %guild_id, channel_id, "announcement delivery failed");
            failed.push(dest.server_name.clone());
        }
    }

    let summary = if failed.is_empty() {
        "Announcement sent successfully to all servers!".to_string()
    } else {
        format!(
            "Announcement sent, but failed to deliver to the following servers:\n{}",
            failed.join("\n")
        )
    };
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(summary))
        .await?;
    Ok(())
}

/// Send an ephemeral response to a slash command (only visible to the invoker).
async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, content: &str) {
    let _ = command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await;
}
