//! Per-invocation actor identity.

use serde::Serialize;

/// Identity and location facts about whoever sent a command.
///
/// Built by the transport for every inbound message and passed explicitly
/// through matching, evaluation and the handler.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ActorContext {
    pub user_id: u64,
    pub channel_id: u64,
    /// `None` for direct messages.
    pub guild_id: Option<u64>,
    pub role_ids: Vec<u64>,
    pub is_maintainer: bool,
    pub is_direct_message: bool,
}

impl ActorContext {
    /// Creates a context for a user in a channel, outside any guild.
    pub fn new(user_id: u64, channel_id: u64) -> Self {
        Self {
            user_id,
            channel_id,
            ..Self::default()
        }
    }

    /// Places the actor in a guild.
    pub fn in_guild(mut self, guild_id: u64) -> Self {
        self.guild_id = Some(guild_id);
        self.is_direct_message = false;
        self
    }

    /// Marks the message as a direct message.
    pub fn direct_message(mut self) -> Self {
        self.guild_id = None;
        self.is_direct_message = true;
        self
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = u64>) -> Self {
        self.role_ids = roles.into_iter().collect();
        self
    }

    pub fn maintainer(mut self, is_maintainer: bool) -> Self {
        self.is_maintainer = is_maintainer;
        self
    }
}
