// Library for the agents binary and tests

pub mod agent;
pub mod classifier;
pub mod config;
pub mod delta;
pub mod error;
pub mod factory;
pub mod models;
pub mod scheduler;
pub mod source;
pub mod units;
