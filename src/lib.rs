#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod forge;
pub mod freeze;
pub mod models;
pub mod webhook;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
