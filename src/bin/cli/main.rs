use clap::Parser;
use command::{Cli, Command};
use dpsboard::context::Error;
use dpsboard::logs;

mod command;
mod commands;
mod context;

#[tokio::main]
async fn main() -> Result<(), Error> {
	logs::init_logging();

	let cli = Cli::parse();
	match cli.command {
		Command::Units => {
			commands::units::run().await?;
		}
		Command::Sword(command) => {
			commands::sword::run(command).await?;
		}
		Command::Leaderboard(args) => {
			commands::leaderboard::run(args).await?;
		}
	}

	Ok(())
}
