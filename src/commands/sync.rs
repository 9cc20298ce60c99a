//! Keeps the rank roles of a guild in line with its leaderboard.

// {{{ Imports
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::commands::discord::{MessageContext, RoleClient};
use crate::context::{Error, UserContext};
use crate::dps::leaderboard::{rank, role_delta, GuildId, RoleDelta, RoleId, UserId};
use crate::store::{RecordStore, RoleRewardStore};
use crate::timed;
// }}}

/// The outcome of a [sync_roles] run.
#[derive(Debug, Default)]
pub struct RoleSync {
	/// Changes that went through
	pub applied: RoleDelta,
	/// Changes discord refused, together with the reason
	pub failed: Vec<(UserId, RoleId, Error)>,
}

/// Brings the guild's rank roles up to date.
///
/// Guilds without any role rewards are left alone. Revokes happen before
/// grants. Every change is attempted on its own, so a member discord refuses
/// to update (e.g. because they left) does not hold up anybody else.
pub async fn sync_roles<R: RoleClient>(
	data: &UserContext,
	roles: &R,
	guild_id: GuildId,
) -> Result<RoleSync, Error> {
	let mut sync = RoleSync::default();
	let role_map = data.store.role_rewards(guild_id)?;
	if role_map.is_empty() {
		return Ok(sync);
	}

	let records = data.store.list_by_guild(guild_id)?;
	let ranked = rank(records.into_iter().map(|r| (r.user_id, r.value)));

	let mapped: BTreeSet<RoleId> = role_map.values().copied().collect();
	let current = timed!("fetch_member_roles", {
		roles.member_roles(guild_id, &mapped).await?
	});

	let delta = role_delta(&ranked, &role_map, &current);

	for (user_id, role_id) in delta.revoke {
		match roles.revoke_role(guild_id, user_id, role_id).await {
			Ok(()) => {
				info!(guild_id, user_id, role_id, "Revoked rank role");
				sync.applied.revoke.push((user_id, role_id));
			}
			Err(e) => {
				error!(guild_id, user_id, role_id, "Could not revoke rank role: {e:?}");
				sync.failed.push((user_id, role_id, e));
			}
		}
	}

	for (user_id, role_id) in delta.grant {
		match roles.grant_role(guild_id, user_id, role_id).await {
			Ok(()) => {
				info!(guild_id, user_id, role_id, "Granted rank role");
				sync.applied.grant.push((user_id, role_id));
			}
			Err(e) => {
				error!(guild_id, user_id, role_id, "Could not grant rank role: {e:?}");
				sync.failed.push((user_id, role_id, e));
			}
		}
	}

	Ok(sync)
}

/// Runs [sync_roles] for the guild the message was sent in. Failures are
/// logged and mentioned in a reply, but are not errors of the command itself.
pub async fn sync_roles_or_warn<C: MessageContext, R: RoleClient>(
	ctx: &mut C,
	roles: &R,
) -> Result<(), Error> {
	let Some(guild_id) = ctx.guild_id() else {
		return Ok(());
	};

	let res = sync_roles(ctx.data(), roles, guild_id).await;
	match res {
		Err(e) => {
			error!(guild_id, "Could not update rank roles: {e:?}");
			ctx.reply(&format!("Note: could not update rank roles ({e})"))
				.await?;
		}
		Ok(sync) => {
			if let Some((_, _, e)) = sync.failed.first() {
				ctx.reply(&format!(
					"Note: could not update rank roles for {} member(s) ({e})",
					sync.failed.len()
				))
				.await?;
			}
		}
	}

	Ok(())
}

/// Periodically synchronises every guild with role rewards. Never returns.
pub async fn role_sync_loop(data: UserContext, http: Arc<serenity::Http>, period: Duration) {
	let mut interval = tokio::time::interval(period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		interval.tick().await;

		let guilds = match data.store.guilds_with_role_rewards() {
			Ok(guilds) => guilds,
			Err(e) => {
				error!("Could not list guilds with role rewards: {e:?}");
				continue;
			}
		};

		for guild_id in guilds {
			// Failed changes were logged one by one already
			if let Err(e) = sync_roles(&data, &*http, guild_id).await {
				error!(guild_id, "Periodic role sync failed: {e:?}");
			}
		}
	}
}

// {{{ Tests
#[cfg(test)]
mod tests {
	use super::*;
	use crate::commands::discord::mock::{MockRoles, RoleCall};
	use crate::context::testing::{get_mock_context, get_test_context};
	use crate::dps::leaderboard::MemberRoles;
	use crate::dps::magnitude::MagnitudeValue;

	fn submit(data: &UserContext, user: u64, mantissa: f64, unit: &str) -> Result<(), Error> {
		let value = MagnitudeValue::create(data.units, mantissa, unit)?;
		data.store.set(1, user, &value)?;
		Ok(())
	}

	#[tokio::test]
	async fn no_rewards_means_no_calls() -> Result<(), Error> {
		let (data, _guard) = get_test_context()?;
		submit(&data, 10, 1.0, "M")?;

		// Failing would surface if the client were asked anything
		let roles = MockRoles::failing();
		let sync = sync_roles(&data, &roles, 1).await?;
		assert!(sync.applied.is_empty());
		assert!(roles.calls().is_empty());

		Ok(())
	}

	#[tokio::test]
	async fn revokes_before_grants() -> Result<(), Error> {
		let (data, _guard) = get_test_context()?;
		data.store.set_role_reward(1, 1, 100)?;
		data.store.set_role_reward(1, 2, 200)?;

		submit(&data, 10, 12345.0, "Qi")?;
		submit(&data, 11, 1.0, "Sx")?;
		submit(&data, 12, 999.0, "K")?;

		let roles = MockRoles::with_members(MemberRoles::from([
			(11, BTreeSet::from([100])),
			(12, BTreeSet::from([200, 7])),
		]));

		let sync = sync_roles(&data, &roles, 1).await?;
		assert!(sync.failed.is_empty());
		assert_eq!(sync.applied.grant, [(10, 100), (11, 200)]);
		assert_eq!(sync.applied.revoke, [(11, 100), (12, 200)]);
		assert_eq!(
			roles.calls(),
			[
				RoleCall::Revoke(11, 100),
				RoleCall::Revoke(12, 200),
				RoleCall::Grant(10, 100),
				RoleCall::Grant(11, 200),
			]
		);

		// Unmapped roles are left alone
		assert_eq!(roles.roles_of(12), BTreeSet::from([7]));

		// A second pass has nothing left to do
		assert!(sync_roles(&data, &roles, 1).await?.applied.is_empty());

		Ok(())
	}

	#[tokio::test]
	async fn departed_members_do_not_block_others() -> Result<(), Error> {
		let (data, _guard) = get_test_context()?;
		data.store.set_role_reward(1, 1, 100)?;
		data.store.set_role_reward(1, 2, 200)?;
		submit(&data, 10, 2.0, "M")?;
		submit(&data, 11, 1.0, "M")?;

		let mut roles =
			MockRoles::with_members(MemberRoles::from([(12, BTreeSet::from([200]))]));
		roles.departed.insert(10);

		let sync = sync_roles(&data, &roles, 1).await?;
		assert_eq!(sync.applied.revoke, [(12, 200)]);
		assert_eq!(sync.applied.grant, [(11, 200)]);
		assert_eq!(sync.failed.len(), 1);
		assert_eq!((sync.failed[0].0, sync.failed[0].1), (10, 100));
		assert_eq!(
			roles.calls(),
			[RoleCall::Revoke(12, 200), RoleCall::Grant(11, 200)]
		);

		Ok(())
	}

	#[tokio::test]
	async fn failed_changes_become_a_note() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		ctx.data.store.set_role_reward(1, 1, 100)?;
		ctx.data.store.set_role_reward(1, 2, 200)?;
		ctx.data
			.store
			.set(1, 10, &MagnitudeValue::create(ctx.data.units, 2.0, "M")?)?;
		ctx.data
			.store
			.set(1, 11, &MagnitudeValue::create(ctx.data.units, 1.0, "M")?)?;

		let mut roles = MockRoles::default();
		roles.departed.insert(10);

		sync_roles_or_warn(&mut ctx, &roles).await?;
		assert_eq!(ctx.messages.len(), 1);
		assert!(ctx
			.last_message()
			.starts_with("Note: could not update rank roles for 1 member(s) (Unknown Member"));
		assert_eq!(roles.calls(), [RoleCall::Grant(11, 200)]);

		Ok(())
	}

	#[tokio::test]
	async fn failures_become_a_note() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		ctx.data.store.set_role_reward(1, 1, 100)?;

		sync_roles_or_warn(&mut ctx, &MockRoles::failing()).await?;
		assert_eq!(ctx.messages.len(), 1);
		assert!(ctx.last_message().starts_with("Note: could not update rank roles"));

		Ok(())
	}

	#[tokio::test]
	async fn direct_messages_are_skipped() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		ctx.data.store.set_role_reward(1, 1, 100)?;
		ctx.guild_id = None;

		sync_roles_or_warn(&mut ctx, &MockRoles::failing()).await?;
		assert!(ctx.messages.is_empty());

		Ok(())
	}
}
// }}}
