use crate::context::{Error, PoiseContext};

pub mod discord;
pub mod dps;
pub mod sword;
pub mod sync;

// {{{ Help
/// Show this help menu
#[poise::command(prefix_command, track_edits, slash_command)]
pub async fn help(
	ctx: PoiseContext<'_>,
	#[description = "Specific command to show help about"]
	#[autocomplete = "poise::builtins::autocomplete_command"]
	command: Option<String>,
) -> Result<(), Error> {
	poise::builtins::help(
		ctx,
		command.as_deref(),
		poise::builtins::HelpConfiguration {
			extra_text_at_bottom: "Submit your DPS with /dps submit, then check the /dps ranking!",
			show_subcommands: true,
			..Default::default()
		},
	)
	.await?;
	Ok(())
}
// }}}
