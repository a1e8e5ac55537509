// Frameworks: process bootstrap and configuration.

pub mod config;
pub mod server;
