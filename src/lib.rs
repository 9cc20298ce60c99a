#![allow(async_fn_in_trait)]

pub mod commands;
pub mod context;
pub mod dps;
pub mod error;
pub mod levenshtein;
pub mod logs;
pub mod store;
pub mod sword;
pub mod time;
