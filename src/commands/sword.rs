// {{{ Imports
use std::fmt::Write;

use crate::commands::discord::MessageContext;
use crate::commands::dps::AUTOCOMPLETE_LIMIT;
use crate::context::{user_error, Error, PoiseContext, TaggedError};
use crate::sword::inventory::Inventory;
use crate::sword::ladder::{RankLadder, Tier};
// }}}

// {{{ Helpers
fn parse_tier(ladder: &RankLadder, name: &str) -> Result<Tier, TaggedError> {
	ladder.tier(name).map_err(user_error)
}

fn parse_inventory(ladder: &RankLadder, text: &str) -> Result<Inventory, TaggedError> {
	Inventory::parse(ladder, text).map_err(user_error)
}

/// Renders breakdown steps as a bullet list, highest rank first.
fn format_steps(ladder: &RankLadder, steps: &[(Tier, u64)]) -> String {
	steps
		.iter()
		.map(|(tier, count)| format!("- {count} × {}", ladder.name(*tier)))
		.collect::<Vec<_>>()
		.join("\n")
}

async fn autocomplete_rank<'a>(
	ctx: PoiseContext<'_>,
	partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
	let ladder = ctx.data().ladder;
	let partial = partial.trim().to_lowercase();
	ladder
		.tiers()
		.map(move |tier| ladder.name(tier))
		.filter(move |name| name.starts_with(&partial))
		.take(AUTOCOMPLETE_LIMIT)
		.map(str::to_owned)
}
// }}}
// {{{ Toplevel
/// Sword rank calculator
#[poise::command(
	prefix_command,
	slash_command,
	subcommands("needed", "remaining", "breakdown", "convert"),
	subcommand_required
)]
pub async fn sword(_ctx: PoiseContext<'_>) -> Result<(), Error> {
	Ok(())
}
// }}}
// {{{ Needed
pub async fn needed_impl<C: MessageContext>(
	ctx: &mut C,
	start: &str,
	target: &str,
) -> Result<u64, TaggedError> {
	let ladder = ctx.data().ladder;
	let start = parse_tier(ladder, start)?;
	let target = parse_tier(ladder, target)?;
	let total = ladder.total_needed(start, target).map_err(user_error)?;

	ctx.reply(&format!(
		"One {} sword takes {total} {} swords.",
		ladder.name(target),
		ladder.name(start)
	))
	.await?;

	Ok(total)
}

/// How many swords of one rank make up a sword of a higher rank
#[poise::command(prefix_command, slash_command)]
async fn needed(
	mut ctx: PoiseContext<'_>,
	#[description = "Rank you start from"]
	#[autocomplete = "autocomplete_rank"]
	start: String,
	#[description = "Rank you want"]
	#[autocomplete = "autocomplete_rank"]
	target: String,
) -> Result<(), Error> {
	let res = needed_impl(&mut ctx, &start, &target).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Remaining
pub async fn remaining_impl<C: MessageContext>(
	ctx: &mut C,
	target: &str,
	owned: &str,
	base: Option<&str>,
) -> Result<u64, TaggedError> {
	let ladder = ctx.data().ladder;
	let target = parse_tier(ladder, target)?;
	let owned = parse_inventory(ladder, owned)?;
	let base = match base {
		Some(base) => parse_tier(ladder, base)?,
		None => ladder.lowest(),
	};

	let shortage = ladder
		.shortage(target, &owned, base)
		.map_err(user_error)?;
	let steps = ladder.breakdown(target, &owned).map_err(user_error)?;

	let (target_name, base_name) = (ladder.name(target), ladder.name(base));
	let mut message = format!(
		"One {target_name} sword takes {} {base_name} swords. You own the equivalent of {}.",
		shortage.required, shortage.owned
	);

	if shortage.needed == 0 {
		write!(message, "\nYou have enough for a {target_name} sword!")?;
	} else {
		write!(
			message,
			"\nYou still need {} {base_name} swords.",
			shortage.needed
		)?;
	}

	if !steps.is_empty() {
		write!(
			message,
			"\nStill to combine:\n{}",
			format_steps(ladder, &steps)
		)?;
	}

	ctx.reply(&message).await?;
	Ok(shortage.needed)
}

/// How many more swords you need for a given rank
#[poise::command(prefix_command, slash_command)]
async fn remaining(
	mut ctx: PoiseContext<'_>,
	#[description = "Rank you want"]
	#[autocomplete = "autocomplete_rank"]
	target: String,
	#[description = "Swords you own, as rank:count pairs (e.g. g:1, ss:2)"] owned: String,
	#[description = "Rank to count in (defaults to e)"]
	#[autocomplete = "autocomplete_rank"]
	base: Option<String>,
) -> Result<(), Error> {
	let res = remaining_impl(&mut ctx, &target, &owned, base.as_deref()).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Breakdown
pub async fn breakdown_impl<C: MessageContext>(
	ctx: &mut C,
	target: &str,
	owned: &str,
) -> Result<Vec<(Tier, u64)>, TaggedError> {
	let ladder = ctx.data().ladder;
	let target = parse_tier(ladder, target)?;
	let owned = parse_inventory(ladder, owned)?;
	let steps = ladder.breakdown(target, &owned).map_err(user_error)?;

	if steps.is_empty() {
		ctx.reply(&format!(
			"Nothing left to combine for a {} sword!",
			ladder.name(target)
		))
		.await?;
	} else {
		ctx.reply(&format!(
			"To get a {} sword, combine:\n{}",
			ladder.name(target),
			format_steps(ladder, &steps)
		))
		.await?;
	}

	Ok(steps)
}

/// Which swords are still missing on the way to a given rank
#[poise::command(prefix_command, slash_command)]
async fn breakdown(
	mut ctx: PoiseContext<'_>,
	#[description = "Rank you want"]
	#[autocomplete = "autocomplete_rank"]
	target: String,
	#[description = "Swords you own, as rank:count pairs (e.g. g:1, ss:2)"] owned: String,
) -> Result<(), Error> {
	let res = breakdown_impl(&mut ctx, &target, &owned).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Convert
pub async fn convert_impl<C: MessageContext>(
	ctx: &mut C,
	from: &str,
	to: &str,
	count: u64,
) -> Result<u64, TaggedError> {
	let ladder = ctx.data().ladder;
	let from = parse_tier(ladder, from)?;
	let to = parse_tier(ladder, to)?;
	let converted = ladder.convert(from, to, count).map_err(user_error)?;

	ctx.reply(&format!(
		"{count} {} = {converted} {}",
		ladder.name(from),
		ladder.name(to)
	))
	.await?;

	Ok(converted)
}

/// Express swords of one rank in another rank
#[poise::command(prefix_command, slash_command)]
async fn convert(
	mut ctx: PoiseContext<'_>,
	#[description = "Rank to convert from"]
	#[autocomplete = "autocomplete_rank"]
	from: String,
	#[description = "Rank to convert to"]
	#[autocomplete = "autocomplete_rank"]
	to: String,
	#[description = "How many swords to convert"] count: u64,
) -> Result<(), Error> {
	let res = convert_impl(&mut ctx, &from, &to, count).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Tests
#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::testing::get_mock_context;

	#[tokio::test]
	async fn needed_counts_base_swords() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let res = needed_impl(&mut ctx, "e", "g").await;
		assert_eq!(ctx.handle_error(res).await?, Some(2187));
		assert_eq!(ctx.last_message(), "One g sword takes 2187 e swords.");

		Ok(())
	}

	#[tokio::test]
	async fn needed_rejects_lower_targets() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let res = needed_impl(&mut ctx, "g", "e").await;
		assert_eq!(ctx.handle_error(res).await?, None);
		assert_eq!(ctx.messages.len(), 1);

		let res = needed_impl(&mut ctx, "e", "zz").await;
		assert_eq!(ctx.handle_error(res).await?, None);
		assert!(ctx.last_message().starts_with("Unrecognized rank `zz`"));

		Ok(())
	}

	#[tokio::test]
	async fn remaining_subtracts_owned_swords() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let res = remaining_impl(&mut ctx, "b", "c:2", None).await;
		assert_eq!(ctx.handle_error(res).await?, Some(9));
		assert_eq!(
			ctx.last_message(),
			"One b sword takes 27 e swords. You own the equivalent of 18.\n\
			You still need 9 e swords.\n\
			Still to combine:\n\
			- 1 × c\n\
			- 3 × d\n\
			- 9 × e"
		);

		Ok(())
	}

	#[tokio::test]
	async fn remaining_in_other_base() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let res = remaining_impl(&mut ctx, "g", "ss:3", Some("s")).await;
		assert_eq!(ctx.handle_error(res).await?, Some(0));
		assert!(ctx.last_message().contains("You have enough for a g sword!"));

		let res = remaining_impl(&mut ctx, "g", "e:1", Some("s")).await;
		assert_eq!(ctx.handle_error(res).await?, None);

		Ok(())
	}

	#[tokio::test]
	async fn remaining_reports_malformed_inventories() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let res = remaining_impl(&mut ctx, "g", "ss", None).await;
		assert_eq!(ctx.handle_error(res).await?, None);
		assert!(ctx.last_message().starts_with("Malformed input"));

		Ok(())
	}

	#[tokio::test]
	async fn breakdown_lists_steps() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let res = breakdown_impl(&mut ctx, "g", "ss:2, s:1, a:6").await;
		let steps = ctx.handle_error(res).await?.unwrap();
		assert_eq!(steps.len(), 2);
		assert_eq!(
			ctx.last_message(),
			"To get a g sword, combine:\n- 1 × ss\n- 2 × s"
		);

		let res = breakdown_impl(&mut ctx, "g", "g:1").await;
		ctx.handle_error(res).await?;
		assert_eq!(ctx.last_message(), "Nothing left to combine for a g sword!");

		Ok(())
	}

	#[tokio::test]
	async fn convert_both_ways() -> Result<(), Error> {
		let (mut ctx, _guard) = get_mock_context()?;
		let res = convert_impl(&mut ctx, "ss", "e", 2).await;
		assert_eq!(ctx.handle_error(res).await?, Some(1458));
		assert_eq!(ctx.last_message(), "2 ss = 1458 e");

		let res = convert_impl(&mut ctx, "e", "d", 4).await;
		assert_eq!(ctx.handle_error(res).await?, None);
		assert_eq!(ctx.messages.len(), 2);

		Ok(())
	}
}
// }}}
