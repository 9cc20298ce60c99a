pub mod leaderboard;
pub mod magnitude;
pub mod unit;
