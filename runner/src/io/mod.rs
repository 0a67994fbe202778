//! Side-effecting helpers: filesystem, config, and child processes.

pub mod config;
pub mod files;
pub mod init;
pub mod process;
pub mod sandbox;
