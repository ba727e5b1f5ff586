pub mod config;
pub mod executor;
pub mod fetch;
pub mod job;
pub mod output;
