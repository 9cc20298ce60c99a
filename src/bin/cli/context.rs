// {{{ Imports
extern crate dpsboard;
use dpsboard::commands::discord::MessageContext;
use dpsboard::context::config::{get_optional_var, BotConfig};
use dpsboard::context::{Error, UserContext};
use dpsboard::dps::leaderboard::{GuildId, UserId};
// }}}

/// Similar in scope to the mock context used by tests, except replies are
/// printed to the standard output.
pub struct CliContext {
	pub user_id: UserId,
	pub guild_id: Option<GuildId>,
	pub data: UserContext,
}

impl CliContext {
	/// Opens the database configured through the environment. The author of
	/// every command is `$DPSBOARD_DISCORD_USER_ID`, if set.
	pub fn new(guild_id: GuildId) -> Result<Self, Error> {
		Self::with_config(Some(guild_id), BotConfig::from_env()?)
	}

	/// For commands which never read stored data, so they run without a
	/// data directory.
	pub fn calculator() -> Result<Self, Error> {
		Self::with_config(None, BotConfig::ephemeral())
	}

	fn with_config(guild_id: Option<GuildId>, config: BotConfig) -> Result<Self, Error> {
		Ok(Self {
			user_id: get_optional_var("DPSBOARD_DISCORD_USER_ID")?.unwrap_or_default(),
			guild_id,
			data: UserContext::new(config)?,
		})
	}
}

impl MessageContext for CliContext {
	fn author_id(&self) -> UserId {
		self.user_id
	}

	fn guild_id(&self) -> Option<GuildId> {
		self.guild_id
	}

	fn data(&self) -> &UserContext {
		&self.data
	}

	async fn reply(&mut self, text: &str) -> Result<(), Error> {
		println!("{text}");
		Ok(())
	}
}
