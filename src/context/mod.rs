// {{{ Imports
use crate::context::config::BotConfig;
use crate::context::db::{connect_db, connect_memory_db};
use crate::dps::unit::UnitRegistry;
use crate::store::SqliteStore;
use crate::sword::ladder::RankLadder;
use crate::timed;
// }}}

pub mod config;
pub mod db;

// {{{ Common types
pub type Error = anyhow::Error;
pub type PoiseContext<'a> = poise::Context<'a, UserContext, Error>;
// }}}
// {{{ Error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Caused by bad input. Reported back to whoever sent it.
	User,
	/// Anything else. Propagated to the framework's error handler.
	Internal,
}

#[derive(Debug)]
pub struct TaggedError {
	pub kind: ErrorKind,
	pub error: Error,
}

impl TaggedError {
	#[inline]
	pub fn new(kind: ErrorKind, error: Error) -> Self {
		Self { kind, error }
	}
}

impl<E: Into<Error>> From<E> for TaggedError {
	fn from(value: E) -> Self {
		Self::new(ErrorKind::Internal, value.into())
	}
}

pub trait TagError {
	fn tag(self, tag: ErrorKind) -> TaggedError;
}

impl<E: Into<Error>> TagError for E {
	fn tag(self, tag: ErrorKind) -> TaggedError {
		TaggedError::new(tag, self.into())
	}
}

/// Shorthand for `.map_err(|e| e.tag(ErrorKind::User))`.
#[inline]
pub fn user_error<E: Into<Error>>(error: E) -> TaggedError {
	error.tag(ErrorKind::User)
}
// }}}
// {{{ UserContext
/// Custom user data passed to all command functions
#[derive(Clone)]
pub struct UserContext {
	pub store: SqliteStore,
	pub units: &'static UnitRegistry,
	pub ladder: &'static RankLadder,
	pub config: BotConfig,
}

impl UserContext {
	#[inline]
	pub fn new(config: BotConfig) -> Result<Self, Error> {
		timed!("create_context", {
			let units = UnitRegistry::standard();
			let db = match config.db_path() {
				Some(path) => connect_db(&path)?,
				None => connect_memory_db()?,
			};

			Ok(Self {
				store: SqliteStore::new(db, units),
				units,
				ladder: RankLadder::swords(),
				config,
			})
		})
	}
}

// }}}
