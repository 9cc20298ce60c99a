//! Ranking of a guild's DPS records, and the role changes the ranking implies.

use std::collections::{BTreeMap, BTreeSet};

use crate::dps::magnitude::MagnitudeValue;

pub type GuildId = u64;
pub type UserId = u64;
pub type RoleId = u64;

/// Maps 1-based leaderboard positions to the role held by whoever is there.
pub type RoleMap = BTreeMap<usize, RoleId>;

/// The mapped roles each member currently holds.
pub type MemberRoles = BTreeMap<UserId, BTreeSet<RoleId>>;

// {{{ Ranking
/// Sorts records by value, highest first. Equal values are ordered by user id
/// so repeated rankings of the same records always agree.
pub fn rank(
	records: impl IntoIterator<Item = (UserId, MagnitudeValue)>,
) -> Vec<(UserId, MagnitudeValue)> {
	let mut ranked: Vec<_> = records.into_iter().collect();
	ranked.sort_by(|(user_a, a), (user_b, b)| b.cmp(a).then(user_a.cmp(user_b)));
	ranked
}

/// The 1-based position of a user in a ranked list.
pub fn position_of(ranked: &[(UserId, MagnitudeValue)], user_id: UserId) -> Option<usize> {
	ranked
		.iter()
		.position(|(id, _)| *id == user_id)
		.map(|i| i + 1)
}
// }}}
// {{{ Role delta
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDelta {
	pub grant: Vec<(UserId, RoleId)>,
	pub revoke: Vec<(UserId, RoleId)>,
}

impl RoleDelta {
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.grant.is_empty() && self.revoke.is_empty()
	}
}

/// Works out which role assignments have to change for the members holding
/// the mapped roles to match the ranking.
///
/// The user at each configured position should hold that position's role, and
/// nobody else should. Only roles present in `role_map` are ever touched.
/// Assignments that are already correct produce no entries.
pub fn role_delta(
	ranked: &[(UserId, MagnitudeValue)],
	role_map: &RoleMap,
	current: &MemberRoles,
) -> RoleDelta {
	let mut entitled: BTreeMap<RoleId, BTreeSet<UserId>> = BTreeMap::new();
	let mut delta = RoleDelta::default();

	for (&position, &role_id) in role_map {
		let holders = entitled.entry(role_id).or_default();
		let Some((user_id, _)) = position.checked_sub(1).and_then(|i| ranked.get(i)) else {
			continue;
		};

		let already_held = current
			.get(user_id)
			.is_some_and(|roles| roles.contains(&role_id));

		// The same role might be configured for multiple positions
		if holders.insert(*user_id) && !already_held {
			delta.grant.push((*user_id, role_id));
		}
	}

	for (user_id, roles) in current {
		for role_id in roles {
			if let Some(holders) = entitled.get(role_id) {
				if !holders.contains(user_id) {
					delta.revoke.push((*user_id, *role_id));
				}
			}
		}
	}

	delta
}
// }}}
