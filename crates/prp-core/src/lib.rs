pub mod cache;
pub mod config;
pub mod error;
pub mod event_log;
pub mod hook;
pub mod io;
pub mod paths;
pub mod prompt;
pub mod prp;
pub mod report;
pub mod scaffold;
pub mod stack;
pub mod summary;
pub mod transcript;

pub use error::{PrpError, Result};
