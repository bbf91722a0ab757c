//! Query functions, one module per table group.

pub mod cache_entries;
pub mod profiles;
pub mod schedules;
pub mod tasks;
