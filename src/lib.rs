pub mod backend;
pub mod codec;
pub mod commands;
pub mod config;
pub mod connection;
pub mod engine;
pub mod frame;
pub mod guard;
pub mod meta;
pub mod server;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
