pub mod inventory;
pub mod ladder;
