pub mod collections;
pub mod config;
pub mod connections;
pub mod log;
