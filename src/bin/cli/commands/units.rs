use crate::context::CliContext;
use dpsboard::commands::discord::MessageContext;
use dpsboard::commands::dps::units_impl;
use dpsboard::context::Error;

pub async fn run() -> Result<(), Error> {
	let mut ctx = CliContext::calculator()?;
	let res = units_impl(&mut ctx).await;
	ctx.handle_error(res).await?;
	Ok(())
}
