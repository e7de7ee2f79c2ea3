pub mod config;
pub mod engine_info;
pub mod error;
pub mod state;
