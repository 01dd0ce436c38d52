pub mod chain;
pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod message;
pub mod notify;
pub mod scheduler;
pub mod storage;
pub mod tasks;
