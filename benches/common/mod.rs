pub mod config;
pub mod fixtures;

pub use config::BenchConfig;
pub use fixtures::{register_waiters, store_keys, waiter_keys};
