#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
	/// List every unit DPS can be submitted in
	Units,
	/// Sword rank calculator
	#[command(subcommand)]
	Sword(crate::commands::sword::Command),
	/// Print the DPS leaderboard of a guild
	Leaderboard(crate::commands::leaderboard::Args),
}
