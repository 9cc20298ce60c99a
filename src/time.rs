/// Runs a block, logging how long it took at debug level.
#[macro_export]
macro_rules! timed {
	($label:expr, $code:block) => {{
		use std::time::Instant;
		let start = Instant::now();
		let result = { $code };
		let duration = start.elapsed();
		tracing::debug!("📊 {}: {:?}", $label, duration);
		result
	}};
}
