use dpsboard::commands::sync::role_sync_loop;
use dpsboard::context::config::{get_var, BotConfig};
use dpsboard::context::{Error, UserContext};
use dpsboard::{commands, logs};
use poise::serenity_prelude::{self as serenity, CreateAllowedMentions};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

// {{{ Error handler
async fn on_error(error: poise::FrameworkError<'_, UserContext, Error>) {
	if let Err(e) = poise::builtins::on_error(error).await {
		error!("Error while handling error: {}", e)
	}
}
// }}}

#[tokio::main]
async fn main() -> Result<(), Error> {
	logs::init_logging();

	let config = BotConfig::from_env()?;
	let token = get_var("DPSBOARD_DISCORD_TOKEN")?;

	// {{{ Poise options
	let options = poise::FrameworkOptions {
		commands: vec![
			commands::help(),
			commands::dps::dps(),
			commands::sword::sword(),
		],
		prefix_options: poise::PrefixFrameworkOptions {
			prefix: Some("!".into()),
			edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
				Duration::from_secs(3600),
			))),
			..Default::default()
		},
		allowed_mentions: Some(CreateAllowedMentions::new()),
		on_error: |error| Box::pin(on_error(error)),
		..Default::default()
	};
	// }}}
	// {{{ Start poise
	let framework = poise::Framework::builder()
		.setup(move |ctx, ready, framework| {
			Box::pin(async move {
				info!("Logged in as {}", ready.user.name);
				poise::builtins::register_globally(ctx, &framework.options().commands).await?;
				let data = UserContext::new(config)?;

				if let Some(period) = data.config.role_sync_interval {
					info!("Synchronising rank roles every {:?}", period);
					tokio::spawn(role_sync_loop(data.clone(), ctx.http.clone(), period));
				}

				Ok(data)
			})
		})
		.options(options)
		.build();

	// Listing members for role synchronisation is a privileged intent
	let intents = serenity::GatewayIntents::non_privileged()
		| serenity::GatewayIntents::MESSAGE_CONTENT
		| serenity::GatewayIntents::GUILD_MEMBERS;

	let mut client = serenity::ClientBuilder::new(token, intents)
		.framework(framework)
		.await?;

	client.start().await?;
	Ok(())
	// }}}
}
