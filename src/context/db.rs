// {{{ Imports
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use include_dir::{include_dir, Dir};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite_migration::Migrations;
use tracing::info;
// }}}

pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

fn run_migrations(conn: &mut rusqlite::Connection) -> anyhow::Result<()> {
	static MIGRATIONS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/migrations");
	static MIGRATIONS: LazyLock<Migrations> = LazyLock::new(|| {
		Migrations::from_directory(&MIGRATIONS_DIR).expect("Could not load migrations")
	});

	MIGRATIONS
		.to_latest(conn)
		.with_context(|| "Could not run migrations")?;
	info!("✅ Ensured db schema is up to date");

	Ok(())
}

pub fn connect_db(db_path: &Path) -> anyhow::Result<SqlitePool> {
	let mut conn = rusqlite::Connection::open(db_path)
		.with_context(|| "Could not connect to sqlite database")?;
	conn.pragma_update(None, "journal_mode", "WAL")?;
	run_migrations(&mut conn)?;

	Pool::new(SqliteConnectionManager::file(db_path))
		.with_context(|| "Could not open sqlite database.")
}

/// A database living as long as the returned pool.
///
/// Every in-memory connection is a database of its own, so the pool holds on
/// to exactly one connection for its whole lifetime.
pub fn connect_memory_db() -> anyhow::Result<SqlitePool> {
	let pool = Pool::builder()
		.max_size(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.build(SqliteConnectionManager::memory())
		.with_context(|| "Could not open in-memory sqlite database.")?;

	run_migrations(&mut *pool.get()?)?;
	Ok(pool)
}
