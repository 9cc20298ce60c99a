//! Persistence of DPS records and per-guild role rewards.

// {{{ Imports
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::warn;

use crate::context::db::SqlitePool;
use crate::context::Error;
use crate::dps::leaderboard::{GuildId, RoleId, RoleMap, UserId};
use crate::dps::magnitude::MagnitudeValue;
use crate::dps::unit::UnitRegistry;
// }}}

// {{{ Traits
#[derive(Debug, Clone)]
pub struct StoredRecord {
	pub user_id: UserId,
	pub value: MagnitudeValue,
	pub submitted_at: DateTime<Utc>,
}

/// Keeps exactly one DPS value per user per guild.
pub trait RecordStore {
	fn get(&self, guild_id: GuildId, user_id: UserId) -> Result<Option<StoredRecord>, Error>;

	/// Stores a value, replacing any previous submission by the same user.
	fn set(&self, guild_id: GuildId, user_id: UserId, value: &MagnitudeValue)
		-> Result<(), Error>;

	fn list_by_guild(&self, guild_id: GuildId) -> Result<Vec<StoredRecord>, Error>;
}

/// Which role each leaderboard position of a guild grants.
pub trait RoleRewardStore {
	fn role_rewards(&self, guild_id: GuildId) -> Result<RoleMap, Error>;

	/// Returns the role previously granted by that position, if any.
	fn set_role_reward(
		&self,
		guild_id: GuildId,
		position: usize,
		role_id: RoleId,
	) -> Result<Option<RoleId>, Error>;

	/// Returns the role the position used to grant, if any.
	fn remove_role_reward(&self, guild_id: GuildId, position: usize)
		-> Result<Option<RoleId>, Error>;

	fn guilds_with_role_rewards(&self) -> Result<Vec<GuildId>, Error>;
}
// }}}
// {{{ Sqlite implementation
// Discord ids fit in 63 bits, so storing them as sqlite's signed integers is
// lossless.
#[inline]
fn to_sql_id(id: u64) -> i64 {
	id as i64
}

#[inline]
fn from_sql_id(id: i64) -> u64 {
	id as u64
}

/// Returns the role the position used to grant, if any.
fn delete_role_reward(
	conn: &Connection,
	guild_id: GuildId,
	position: usize,
) -> Result<Option<RoleId>, Error> {
	let removed = conn
		.prepare_cached(
			"DELETE FROM role_rewards WHERE guild_id = ? AND position = ? RETURNING role_id",
		)?
		.query_row((to_sql_id(guild_id), position as i64), |row| {
			row.get::<_, i64>("role_id")
		})
		.optional()?
		.map(from_sql_id);

	Ok(removed)
}

#[derive(Clone)]
pub struct SqliteStore {
	pool: SqlitePool,
	units: &'static UnitRegistry,
}

impl SqliteStore {
	pub fn new(pool: SqlitePool, units: &'static UnitRegistry) -> Self {
		Self { pool, units }
	}

	/// Rows whose unit is no longer registered are skipped, since they cannot
	/// be compared with anything.
	fn record_from_row(&self, row: &Row<'_>) -> Result<Option<StoredRecord>, rusqlite::Error> {
		let user_id = from_sql_id(row.get("user_id")?);
		let mantissa: f64 = row.get("mantissa")?;
		let unit: String = row.get("unit")?;
		let submitted_at: DateTime<Utc> = row.get("submitted_at")?;

		let value = self
			.units
			.lookup(&unit)
			.and_then(|unit| MagnitudeValue::from_unit(mantissa, unit));

		match value {
			Ok(value) => Ok(Some(StoredRecord {
				user_id,
				value,
				submitted_at,
			})),
			Err(err) => {
				warn!(user_id, "Skipping stored DPS record: {err}");
				Ok(None)
			}
		}
	}
}

impl RecordStore for SqliteStore {
	fn get(&self, guild_id: GuildId, user_id: UserId) -> Result<Option<StoredRecord>, Error> {
		let record = self
			.pool
			.get()?
			.prepare_cached("SELECT * FROM dps_records WHERE guild_id = ? AND user_id = ?")?
			.query_row((to_sql_id(guild_id), to_sql_id(user_id)), |row| {
				self.record_from_row(row)
			})
			.optional()?
			.flatten();

		Ok(record)
	}

	fn set(
		&self,
		guild_id: GuildId,
		user_id: UserId,
		value: &MagnitudeValue,
	) -> Result<(), Error> {
		self.pool
			.get()?
			.prepare_cached(
				"
          INSERT INTO dps_records(guild_id, user_id, mantissa, unit, submitted_at)
          VALUES (?, ?, ?, ?, ?)
          ON CONFLICT(guild_id, user_id) DO UPDATE SET
            mantissa=excluded.mantissa,
            unit=excluded.unit,
            submitted_at=excluded.submitted_at
        ",
			)?
			.execute((
				to_sql_id(guild_id),
				to_sql_id(user_id),
				value.mantissa(),
				value.unit().symbol(),
				Utc::now(),
			))?;

		Ok(())
	}

	fn list_by_guild(&self, guild_id: GuildId) -> Result<Vec<StoredRecord>, Error> {
		let conn = self.pool.get()?;
		let mut statement = conn.prepare_cached("SELECT * FROM dps_records WHERE guild_id = ?")?;
		let records = statement
			.query_map([to_sql_id(guild_id)], |row| self.record_from_row(row))?
			.filter_map(|record| record.transpose())
			.collect::<Result<Vec<_>, _>>()?;

		Ok(records)
	}
}

impl RoleRewardStore for SqliteStore {
	fn role_rewards(&self, guild_id: GuildId) -> Result<RoleMap, Error> {
		let conn = self.pool.get()?;
		let mut statement = conn.prepare_cached(
			"SELECT position, role_id FROM role_rewards WHERE guild_id = ? ORDER BY position",
		)?;
		let rewards = statement
			.query_map([to_sql_id(guild_id)], |row| {
				let position: i64 = row.get("position")?;
				let role_id: i64 = row.get("role_id")?;
				Ok((position as usize, from_sql_id(role_id)))
			})?
			.collect::<Result<RoleMap, _>>()?;

		Ok(rewards)
	}

	fn set_role_reward(
		&self,
		guild_id: GuildId,
		position: usize,
		role_id: RoleId,
	) -> Result<Option<RoleId>, Error> {
		let mut conn = self.pool.get()?;
		let transaction = conn.transaction()?;

		let previous = delete_role_reward(&transaction, guild_id, position)?;
		transaction
			.prepare_cached("INSERT INTO role_rewards(guild_id, position, role_id) VALUES (?, ?, ?)")?
			.execute((to_sql_id(guild_id), position as i64, to_sql_id(role_id)))?;

		transaction.commit()?;
		Ok(previous)
	}

	fn remove_role_reward(
		&self,
		guild_id: GuildId,
		position: usize,
	) -> Result<Option<RoleId>, Error> {
		delete_role_reward(&*self.pool.get()?, guild_id, position)
	}

	fn guilds_with_role_rewards(&self) -> Result<Vec<GuildId>, Error> {
		let conn = self.pool.get()?;
		let mut statement = conn.prepare_cached("SELECT DISTINCT guild_id FROM role_rewards")?;
		let guilds = statement
			.query_map([], |row| row.get::<_, i64>("guild_id").map(from_sql_id))?
			.collect::<Result<Vec<_>, _>>()?;

		Ok(guilds)
	}
}
// }}}
// {{{ Tests
#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::testing::get_test_context;

	fn value(mantissa: f64, unit: &str) -> MagnitudeValue {
		MagnitudeValue::create(UnitRegistry::standard(), mantissa, unit).unwrap()
	}

	#[test]
	fn resubmission_overwrites() -> Result<(), Error> {
		let (ctx, _guard) = get_test_context()?;
		let store = &ctx.store;

		assert!(store.get(1, 10)?.is_none());

		store.set(1, 10, &value(12345.0, "Qi"))?;
		let record = store.get(1, 10)?.unwrap();
		assert_eq!(record.user_id, 10);
		assert_eq!(record.value.to_string(), "12345Qi");

		store.set(1, 10, &value(1.5, "Uvg"))?;
		let record = store.get(1, 10)?.unwrap();
		assert_eq!(record.value.to_string(), "1.5Uvg");
		assert_eq!(store.list_by_guild(1)?.len(), 1);

		Ok(())
	}

	#[test]
	fn guilds_are_separate() -> Result<(), Error> {
		let (ctx, _guard) = get_test_context()?;
		let store = &ctx.store;

		store.set(1, 10, &value(1.0, "K"))?;
		store.set(1, 11, &value(2.0, "K"))?;
		store.set(2, 10, &value(3.0, "M"))?;

		let mut users: Vec<_> = store.list_by_guild(1)?.iter().map(|r| r.user_id).collect();
		users.sort();
		assert_eq!(users, [10, 11]);
		assert_eq!(store.get(2, 10)?.unwrap().value.to_string(), "3M");
		assert!(store.list_by_guild(3)?.is_empty());

		Ok(())
	}

	#[test]
	fn large_ids_survive() -> Result<(), Error> {
		let (ctx, _guard) = get_test_context()?;
		let store = &ctx.store;

		let guild = 1_234_567_890_123_456_789;
		let user = (1 << 62) + 7;
		store.set(guild, user, &value(1.0, "Dc"))?;
		assert_eq!(store.get(guild, user)?.unwrap().user_id, user);

		Ok(())
	}

	#[test]
	fn unknown_units_are_skipped() -> Result<(), Error> {
		let (ctx, _guard) = get_test_context()?;
		let store = &ctx.store;

		store.set(1, 10, &value(1.0, "K"))?;
		ctx.store.pool.get()?.execute(
			"INSERT INTO dps_records(guild_id, user_id, mantissa, unit, submitted_at) VALUES (1, 11, 5.0, 'Bogus', ?)",
			[Utc::now()],
		)?;

		let records = store.list_by_guild(1)?;
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].user_id, 10);
		assert!(store.get(1, 11)?.is_none());

		Ok(())
	}

	#[test]
	fn role_rewards() -> Result<(), Error> {
		let (ctx, _guard) = get_test_context()?;
		let store = &ctx.store;

		assert!(store.role_rewards(1)?.is_empty());
		assert_eq!(store.set_role_reward(1, 1, 100)?, None);
		assert_eq!(store.set_role_reward(1, 10, 1000)?, None);
		assert_eq!(store.set_role_reward(1, 1, 101)?, Some(100));
		assert_eq!(store.set_role_reward(2, 3, 300)?, None);

		assert_eq!(store.role_rewards(1)?, RoleMap::from([(1, 101), (10, 1000)]));

		let mut guilds = store.guilds_with_role_rewards()?;
		guilds.sort();
		assert_eq!(guilds, [1, 2]);

		assert_eq!(store.remove_role_reward(1, 10)?, Some(1000));
		assert_eq!(store.remove_role_reward(1, 10)?, None);
		assert_eq!(store.role_rewards(1)?, RoleMap::from([(1, 101)]));

		Ok(())
	}

	#[test]
	fn failed_replacements_keep_the_old_reward() -> Result<(), Error> {
		let (ctx, _guard) = get_test_context()?;
		let store = &ctx.store;

		store.set_role_reward(1, 1, 100)?;
		ctx.store.pool.get()?.execute_batch(
			"CREATE TRIGGER reject_role BEFORE INSERT ON role_rewards WHEN NEW.role_id = 666
			BEGIN SELECT RAISE(ABORT, 'role rejected'); END;",
		)?;

		assert!(store.set_role_reward(1, 1, 666).is_err());
		assert_eq!(store.role_rewards(1)?, RoleMap::from([(1, 100)]));

		assert_eq!(store.set_role_reward(1, 1, 101)?, Some(100));
		assert_eq!(store.role_rewards(1)?, RoleMap::from([(1, 101)]));

		Ok(())
	}
}
// }}}
