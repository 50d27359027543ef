pub mod app;
pub mod client;
pub mod journal;
pub mod monitoring;
pub mod session;
pub mod storage;
pub mod types;
pub mod utils;

pub use crate::types::*;
