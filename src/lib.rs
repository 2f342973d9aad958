pub mod cli;
pub mod codec;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod exit;
pub mod logs;
pub mod store;
pub mod ui;
pub mod validate;
