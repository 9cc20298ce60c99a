// {{{ Imports
use crate::context::CliContext;
use dpsboard::commands::discord::MessageContext;
use dpsboard::commands::sword::{breakdown_impl, convert_impl, needed_impl, remaining_impl};
use dpsboard::context::Error;
// }}}

#[derive(clap::Subcommand)]
pub enum Command {
	/// How many `start` swords make up one `target` sword
	Needed { start: String, target: String },
	/// How many more swords are needed for a `target` sword
	Remaining {
		target: String,
		/// Owned swords, as rank:count pairs (e.g. "g:1, ss:2")
		owned: String,
		/// Rank to count in (defaults to the lowest rank)
		#[arg(long)]
		base: Option<String>,
	},
	/// Which swords are still missing on the way to a `target` sword
	Breakdown {
		target: String,
		/// Owned swords, as rank:count pairs (e.g. "g:1, ss:2")
		owned: String,
	},
	/// Express swords of one rank in another rank
	Convert { from: String, to: String, count: u64 },
}

pub async fn run(command: Command) -> Result<(), Error> {
	let mut ctx = CliContext::calculator()?;
	match command {
		Command::Needed { start, target } => {
			let res = needed_impl(&mut ctx, &start, &target).await;
			ctx.handle_error(res).await?;
		}
		Command::Remaining {
			target,
			owned,
			base,
		} => {
			let res = remaining_impl(&mut ctx, &target, &owned, base.as_deref()).await;
			ctx.handle_error(res).await?;
		}
		Command::Breakdown { target, owned } => {
			let res = breakdown_impl(&mut ctx, &target, &owned).await;
			ctx.handle_error(res).await?;
		}
		Command::Convert { from, to, count } => {
			let res = convert_impl(&mut ctx, &from, &to, count).await;
			ctx.handle_error(res).await?;
		}
	}

	Ok(())
}
