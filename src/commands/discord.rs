// {{{ Imports
use std::collections::BTreeSet;

use poise::serenity_prelude::{self as serenity, CreateAllowedMentions};
use poise::CreateReply;

use crate::context::{Error, ErrorKind, TaggedError, UserContext};
use crate::dps::leaderboard::{GuildId, MemberRoles, RoleId, UserId};
// }}}

// {{{ Message context
pub trait MessageContext {
	/// Get the user context held by the message
	fn data(&self) -> &UserContext;
	fn author_id(&self) -> UserId;

	/// The guild the message was sent in, if any
	fn guild_id(&self) -> Option<GuildId>;

	/// Reply to the current message. Mentions in the text never ping anybody.
	async fn reply(&mut self, text: &str) -> Result<(), Error>;

	/// Reports user errors back to whoever sent the message, and hands
	/// internal errors back to the caller.
	async fn handle_error<V>(&mut self, res: Result<V, TaggedError>) -> Result<Option<V>, Error> {
		match res {
			Ok(v) => Ok(Some(v)),
			Err(e) => match e.kind {
				ErrorKind::Internal => Err(e.error),
				ErrorKind::User => {
					self.reply(&format!("{}", e.error)).await?;
					Ok(None)
				}
			},
		}
	}
}

impl<'a> MessageContext for poise::Context<'a, UserContext, Error> {
	fn data(&self) -> &UserContext {
		Self::data(*self)
	}

	fn author_id(&self) -> UserId {
		self.author().id.get()
	}

	fn guild_id(&self) -> Option<GuildId> {
		Self::guild_id(*self).map(|id| id.get())
	}

	async fn reply(&mut self, text: &str) -> Result<(), Error> {
		let reply = CreateReply::default()
			.content(text)
			.allowed_mentions(CreateAllowedMentions::new());

		Self::send(*self, reply).await?;
		Ok(())
	}
}
// }}}
// {{{ Role client
/// Reads and mutates the roles of guild members.
pub trait RoleClient {
	/// Every member holding at least one of `roles`, together with the subset
	/// of `roles` they hold.
	async fn member_roles(
		&self,
		guild_id: GuildId,
		roles: &BTreeSet<RoleId>,
	) -> Result<MemberRoles, Error>;

	async fn grant_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId)
		-> Result<(), Error>;

	async fn revoke_role(
		&self,
		guild_id: GuildId,
		user_id: UserId,
		role_id: RoleId,
	) -> Result<(), Error>;
}

/// The largest page of members discord hands out at once.
const MEMBER_PAGE_SIZE: u64 = 1000;

const AUDIT_LOG_REASON: &str = "DPS leaderboard rank changed";

impl RoleClient for serenity::Http {
	async fn member_roles(
		&self,
		guild_id: GuildId,
		roles: &BTreeSet<RoleId>,
	) -> Result<MemberRoles, Error> {
		let guild_id = serenity::GuildId::new(guild_id);
		let mut result = MemberRoles::new();
		let mut after: Option<serenity::UserId> = None;

		loop {
			let page = guild_id.members(self, Some(MEMBER_PAGE_SIZE), after).await?;

			for member in &page {
				let held: BTreeSet<RoleId> = member
					.roles
					.iter()
					.map(|role| role.get())
					.filter(|role| roles.contains(role))
					.collect();

				if !held.is_empty() {
					result.insert(member.user.id.get(), held);
				}
			}

			match page.last() {
				Some(last) if page.len() as u64 == MEMBER_PAGE_SIZE => {
					after = Some(last.user.id);
				}
				_ => break,
			}
		}

		Ok(result)
	}

	async fn grant_role(
		&self,
		guild_id: GuildId,
		user_id: UserId,
		role_id: RoleId,
	) -> Result<(), Error> {
		self.add_member_role(
			serenity::GuildId::new(guild_id),
			serenity::UserId::new(user_id),
			serenity::RoleId::new(role_id),
			Some(AUDIT_LOG_REASON),
		)
		.await?;
		Ok(())
	}

	async fn revoke_role(
		&self,
		guild_id: GuildId,
		user_id: UserId,
		role_id: RoleId,
	) -> Result<(), Error> {
		self.remove_member_role(
			serenity::GuildId::new(guild_id),
			serenity::UserId::new(user_id),
			serenity::RoleId::new(role_id),
			Some(AUDIT_LOG_REASON),
		)
		.await?;
		Ok(())
	}
}
// }}}
