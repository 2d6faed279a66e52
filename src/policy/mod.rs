//! Retention policies.

pub mod gfs;

pub use gfs::{GfsPolicy, DEFAULT_DAILY_COUNT, DEFAULT_WEEKLY_COUNT, DEFAULT_WEEK_START};
