// {{{ Imports
use crate::context::CliContext;
use dpsboard::commands::discord::MessageContext;
use dpsboard::commands::dps::ranking_impl;
use dpsboard::context::Error;
use dpsboard::dps::leaderboard::GuildId;
// }}}

#[derive(clap::Args)]
pub struct Args {
	/// Id of the guild whose leaderboard to print
	#[arg(long)]
	guild: GuildId,
}

/// Prints the ranking without touching anybody's roles.
pub async fn run(args: Args) -> Result<(), Error> {
	let mut ctx = CliContext::new(args.guild)?;
	let res = ranking_impl(&mut ctx).await;
	ctx.handle_error(res).await?;
	Ok(())
}
