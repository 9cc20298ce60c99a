pub mod leaderboard;
pub mod sword;
pub mod units;
