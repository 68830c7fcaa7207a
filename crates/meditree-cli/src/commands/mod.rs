pub mod config;
pub mod modes;
pub mod session;
pub mod stats;
