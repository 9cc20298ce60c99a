// {{{ Imports
use std::fmt::Write;

use anyhow::anyhow;
use poise::serenity_prelude as serenity;
use tracing::info;

use crate::commands::discord::{MessageContext, RoleClient};
use crate::commands::sync::sync_roles_or_warn;
use crate::context::{user_error, Error, PoiseContext, TaggedError};
use crate::dps::leaderboard::{position_of, rank, GuildId, RoleId, UserId};
use crate::dps::magnitude::MagnitudeValue;
use crate::dps::unit::DEFAULT_GROUP_SIZE;
use crate::store::{RecordStore, RoleRewardStore};
// }}}

/// Discord refuses autocomplete responses with more choices than this.
pub const AUTOCOMPLETE_LIMIT: usize = 25;

// {{{ Helpers
fn require_guild(ctx: &impl MessageContext) -> Result<GuildId, TaggedError> {
	ctx.guild_id()
		.ok_or_else(|| user_error(anyhow!("This command only works inside a server!")))
}

async fn autocomplete_unit<'a>(
	ctx: PoiseContext<'_>,
	partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
	let units = ctx.data().units;
	units
		.search(partial)
		.take(AUTOCOMPLETE_LIMIT)
		.map(|unit| unit.symbol().to_owned())
}
// }}}
// {{{ Toplevel
/// DPS leaderboard
#[poise::command(
	prefix_command,
	slash_command,
	subcommands("submit", "ranking", "show", "units", "roles"),
	subcommand_required
)]
pub async fn dps(_ctx: PoiseContext<'_>) -> Result<(), Error> {
	Ok(())
}
// }}}
// {{{ Submit
pub async fn submit_impl<C: MessageContext, R: RoleClient>(
	ctx: &mut C,
	roles: &R,
	mantissa: f64,
	unit: &str,
) -> Result<MagnitudeValue, TaggedError> {
	let guild_id = require_guild(&*ctx)?;
	let value = MagnitudeValue::create(ctx.data().units, mantissa, unit).map_err(user_error)?;

	let user_id = ctx.author_id();
	ctx.data().store.set(guild_id, user_id, &value)?;
	info!(guild_id, user_id, "Registered DPS {value}");

	ctx.reply(&format!("Registered DPS {value}!")).await?;
	sync_roles_or_warn(ctx, roles).await?;

	Ok(value)
}

/// Submit your DPS, replacing your previous submission
#[poise::command(prefix_command, slash_command, guild_only)]
async fn submit(
	mut ctx: PoiseContext<'_>,
	#[description = "Your DPS, without the unit (e.g. 12345)"] value: f64,
	#[description = "The unit of your DPS (e.g. Qi)"]
	#[autocomplete = "autocomplete_unit"]
	unit: String,
) -> Result<(), Error> {
	let http = ctx.serenity_context().http.clone();
	let res = submit_impl(&mut ctx, &*http, value, &unit).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Ranking
/// Replies with the top of the guild's leaderboard.
pub async fn ranking_impl<C: MessageContext>(ctx: &mut C) -> Result<(), TaggedError> {
	let guild_id = require_guild(&*ctx)?;
	let records = ctx.data().store.list_by_guild(guild_id)?;

	if records.is_empty() {
		ctx.reply("No DPS records yet.").await?;
		return Ok(());
	}

	let ranked = rank(records.into_iter().map(|r| (r.user_id, r.value)));
	let mut message = String::new();
	for (i, (user_id, value)) in ranked
		.iter()
		.take(ctx.data().config.leaderboard_size)
		.enumerate()
	{
		if i > 0 {
			message.push('\n');
		}

		write!(message, "{}. <@{user_id}> - {value}", i + 1)?;
	}

	ctx.reply(&message).await?;
	Ok(())
}

/// Show the server's DPS leaderboard
#[poise::command(prefix_command, slash_command, guild_only)]
async fn ranking(mut ctx: PoiseContext<'_>) -> Result<(), Error> {
	let res = ranking_impl(&mut ctx).await;
	if ctx.handle_error(res).await?.is_some() {
		let http = ctx.serenity_context().http.clone();
		sync_roles_or_warn(&mut ctx, &*http).await?;
	}

	Ok(())
}
// }}}
// {{{ Show
pub async fn show_impl<C: MessageContext>(
	ctx: &mut C,
	user_id: Option<UserId>,
) -> Result<(), TaggedError> {
	let guild_id = require_guild(&*ctx)?;
	let user_id = user_id.unwrap_or_else(|| ctx.author_id());

	let Some(record) = ctx.data().store.get(guild_id, user_id)? else {
		ctx.reply(&format!("<@{user_id}> has not submitted their DPS yet."))
			.await?;
		return Ok(());
	};

	let records = ctx.data().store.list_by_guild(guild_id)?;
	let ranked = rank(records.into_iter().map(|r| (r.user_id, r.value)));
	let position = position_of(&ranked, user_id)
		.map(|p| format!("#{p} of {}", ranked.len()))
		.unwrap_or_else(|| String::from("unranked"));

	ctx.reply(&format!(
		"<@{user_id}>: {} ({position}), submitted <t:{}:R>",
		record.value,
		record.submitted_at.timestamp()
	))
	.await?;

	Ok(())
}

/// Show somebody's current DPS
#[poise::command(prefix_command, slash_command, guild_only)]
async fn show(
	mut ctx: PoiseContext<'_>,
	#[description = "Whose DPS to show (defaults to yours)"] user: Option<serenity::User>,
) -> Result<(), Error> {
	let res = show_impl(&mut ctx, user.map(|u| u.id.get())).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Units
pub async fn units_impl<C: MessageContext>(ctx: &mut C) -> Result<(), TaggedError> {
	let mut message = String::from("Units, from smallest to largest:");
	for group in ctx.data().units.list_groups(DEFAULT_GROUP_SIZE) {
		let symbols = group
			.units
			.iter()
			.map(|unit| unit.symbol())
			.collect::<Vec<_>>()
			.join(", ");

		write!(message, "\n**{}**: {symbols}", group.label())?;
	}

	ctx.reply(&message).await?;
	Ok(())
}

/// List every unit DPS can be submitted in
#[poise::command(prefix_command, slash_command)]
async fn units(mut ctx: PoiseContext<'_>) -> Result<(), Error> {
	let res = units_impl(&mut ctx).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Roles
/// Roles granted to the top of the leaderboard
#[poise::command(
	prefix_command,
	slash_command,
	subcommands("roles_set", "roles_remove", "roles_list"),
	subcommand_required,
	guild_only,
	required_permissions = "MANAGE_ROLES"
)]
async fn roles(_ctx: PoiseContext<'_>) -> Result<(), Error> {
	Ok(())
}

// {{{ Set
pub async fn roles_set_impl<C: MessageContext, R: RoleClient>(
	ctx: &mut C,
	roles: &R,
	position: usize,
	role_id: RoleId,
) -> Result<(), TaggedError> {
	let guild_id = require_guild(&*ctx)?;
	if position == 0 {
		return Err(user_error(anyhow!("Leaderboard positions start at 1!")));
	}

	let previous = ctx
		.data()
		.store
		.set_role_reward(guild_id, position, role_id)?;
	info!(guild_id, position, role_id, "Configured rank role");

	let mut message = format!("Position #{position} now grants <@&{role_id}>");
	match previous {
		Some(previous) if previous != role_id => {
			write!(message, " (instead of <@&{previous}>)")?;
		}
		_ => {}
	}

	ctx.reply(&message).await?;
	sync_roles_or_warn(ctx, roles).await?;

	Ok(())
}

/// Grant a role to whoever holds a leaderboard position
#[poise::command(
	prefix_command,
	slash_command,
	rename = "set",
	guild_only,
	required_permissions = "MANAGE_ROLES"
)]
async fn roles_set(
	mut ctx: PoiseContext<'_>,
	#[description = "Leaderboard position, starting at 1"]
	#[min = 1]
	position: usize,
	#[description = "Role to grant"] role: serenity::Role,
) -> Result<(), Error> {
	let http = ctx.serenity_context().http.clone();
	let res = roles_set_impl(&mut ctx, &*http, position, role.id.get()).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Remove
pub async fn roles_remove_impl<C: MessageContext>(
	ctx: &mut C,
	position: usize,
) -> Result<(), TaggedError> {
	let guild_id = require_guild(&*ctx)?;
	if position == 0 {
		return Err(user_error(anyhow!("Leaderboard positions start at 1!")));
	}

	match ctx.data().store.remove_role_reward(guild_id, position)? {
		Some(role_id) => {
			info!(guild_id, position, role_id, "Removed rank role");
			ctx.reply(&format!(
				"Position #{position} no longer grants <@&{role_id}>. Members keep the role until it is removed by hand."
			))
			.await?;
		}
		None => {
			ctx.reply(&format!("Position #{position} does not grant any role."))
				.await?;
		}
	}

	Ok(())
}

/// Stop granting a role for a leaderboard position
#[poise::command(
	prefix_command,
	slash_command,
	rename = "remove",
	guild_only,
	required_permissions = "MANAGE_ROLES"
)]
async fn roles_remove(
	mut ctx: PoiseContext<'_>,
	#[description = "Leaderboard position, starting at 1"]
	#[min = 1]
	position: usize,
) -> Result<(), Error> {
	let res = roles_remove_impl(&mut ctx, position).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ List
pub async fn roles_list_impl<C: MessageContext>(ctx: &mut C) -> Result<(), TaggedError> {
	let guild_id = require_guild(&*ctx)?;
	let rewards = ctx.data().store.role_rewards(guild_id)?;

	if rewards.is_empty() {
		ctx.reply("No rank roles configured.").await?;
		return Ok(());
	}

	let message = rewards
		.iter()
		.map(|(position, role_id)| format!("#{position}: <@&{role_id}>"))
		.collect::<Vec<_>>()
		.join("\n");

	ctx.reply(&message).await?;
	Ok(())
}

/// List the roles granted for each leaderboard position
#[poise::command(prefix_command, slash_command, rename = "list", guild_only)]
async fn roles_list(mut ctx: PoiseContext<'_>) -> Result<(), Error> {
	let res = roles_list_impl(&mut ctx).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// }}}
// {{{ Tests
#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;
	use crate::commands::discord::mock::{MockContext, MockRoles, RoleCall};
	use crate::context::testing::get_mock_context;
	use crate::dps::leaderboard::MemberRoles;

	async fn submit_as(
		ctx: &mut MockContext,
		user_id: UserId,
		mantissa: f64,
		unit: &str,
	) -> Result<(), Error> {
		ctx.user_id = user_id;
		let res = submit_impl(ctx, &MockRoles::default(), mantissa, unit).await;
		ctx.handle_error(res).await?;
		Ok(())
	}

	#[tokio::test]
	async fn submit_registers_value() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		submit_as(&mut ctx, 10, 12345.0, "Qi").await?;
		assert_eq!(ctx.messages, ["Registered DPS 12345Qi!"]);

		let record = ctx.data.store.get(1, 10)?.unwrap();
		assert_eq!(record.value.to_string(), "12345Qi");

		Ok(())
	}

	#[tokio::test]
	async fn submit_reports_bad_units() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		submit_as(&mut ctx, 10, 5.0, "Qx").await?;
		assert_eq!(ctx.messages.len(), 1);
		assert!(ctx.last_message().starts_with("Unrecognized unit `Qx`"));
		assert!(ctx.data.store.get(1, 10)?.is_none());

		Ok(())
	}

	#[tokio::test]
	async fn submit_requires_a_guild() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		ctx.guild_id = None;
		submit_as(&mut ctx, 10, 5.0, "K").await?;
		assert_eq!(ctx.messages, ["This command only works inside a server!"]);

		Ok(())
	}

	#[tokio::test]
	async fn submit_syncs_roles() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		ctx.data.store.set_role_reward(1, 1, 100)?;
		submit_as(&mut ctx, 11, 1.0, "M").await?;

		let roles = MockRoles::with_members(MemberRoles::from([(11, BTreeSet::from([100]))]));
		ctx.user_id = 10;
		let res = submit_impl(&mut ctx, &roles, 1.0, "B").await;
		ctx.handle_error(res).await?;

		assert_eq!(
			roles.calls(),
			[RoleCall::Revoke(11, 100), RoleCall::Grant(10, 100)]
		);

		Ok(())
	}

	#[tokio::test]
	async fn ranking_orders_across_units() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		submit_as(&mut ctx, 10, 12345.0, "Qi").await?;
		submit_as(&mut ctx, 11, 1.0, "Sx").await?;
		submit_as(&mut ctx, 12, 999.0, "K").await?;

		let res = ranking_impl(&mut ctx).await;
		ctx.handle_error(res).await?;
		assert_eq!(
			ctx.last_message(),
			"1. <@10> - 12345Qi\n2. <@11> - 1Sx\n3. <@12> - 999K"
		);

		Ok(())
	}

	#[tokio::test]
	async fn ranking_is_capped() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		ctx.data.config.leaderboard_size = 2;
		for user in 0..5 {
			submit_as(&mut ctx, user, user as f64 + 1.0, "K").await?;
		}

		let res = ranking_impl(&mut ctx).await;
		ctx.handle_error(res).await?;
		assert_eq!(ctx.last_message(), "1. <@4> - 5K\n2. <@3> - 4K");

		Ok(())
	}

	#[tokio::test]
	async fn empty_ranking() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let res = ranking_impl(&mut ctx).await;
		ctx.handle_error(res).await?;
		assert_eq!(ctx.messages, ["No DPS records yet."]);

		Ok(())
	}

	#[tokio::test]
	async fn show_includes_position() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		submit_as(&mut ctx, 10, 1.0, "M").await?;
		submit_as(&mut ctx, 11, 2.0, "M").await?;

		let res = show_impl(&mut ctx, Some(10)).await;
		ctx.handle_error(res).await?;
		assert!(ctx.last_message().starts_with("<@10>: 1M (#2 of 2), submitted <t:"));

		let res = show_impl(&mut ctx, Some(12)).await;
		ctx.handle_error(res).await?;
		assert_eq!(ctx.last_message(), "<@12> has not submitted their DPS yet.");

		Ok(())
	}

	#[tokio::test]
	async fn units_are_grouped() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let res = units_impl(&mut ctx).await;
		ctx.handle_error(res).await?;

		let message = ctx.last_message();
		assert!(message.contains("\n**K - No**: K, M, B, T, Qa, Qi, Sx, Sp, Oc, No\n"));
		assert!(message.ends_with("Dc"));

		Ok(())
	}

	#[tokio::test]
	async fn role_rewards_can_be_managed() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let roles = MockRoles::default();

		let res = roles_list_impl(&mut ctx).await;
		ctx.handle_error(res).await?;
		assert_eq!(ctx.last_message(), "No rank roles configured.");

		let res = roles_set_impl(&mut ctx, &roles, 0, 100).await;
		ctx.handle_error(res).await?;
		assert_eq!(ctx.last_message(), "Leaderboard positions start at 1!");

		let res = roles_set_impl(&mut ctx, &roles, 1, 100).await;
		ctx.handle_error(res).await?;
		let res = roles_set_impl(&mut ctx, &roles, 1, 101).await;
		ctx.handle_error(res).await?;
		assert_eq!(
			ctx.last_message(),
			"Position #1 now grants <@&101> (instead of <@&100>)"
		);

		let res = roles_set_impl(&mut ctx, &roles, 3, 300).await;
		ctx.handle_error(res).await?;
		let res = roles_list_impl(&mut ctx).await;
		ctx.handle_error(res).await?;
		assert_eq!(ctx.last_message(), "#1: <@&101>\n#3: <@&300>");

		let res = roles_remove_impl(&mut ctx, 3).await;
		ctx.handle_error(res).await?;
		let res = roles_remove_impl(&mut ctx, 3).await;
		ctx.handle_error(res).await?;
		assert_eq!(ctx.last_message(), "Position #3 does not grant any role.");

		let res = roles_remove_impl(&mut ctx, 0).await;
		assert_eq!(ctx.handle_error(res).await?, None);
		assert_eq!(ctx.last_message(), "Leaderboard positions start at 1!");

		Ok(())
	}
}
// }}}
