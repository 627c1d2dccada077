pub mod config;
pub mod hook;
pub mod optimize;
pub mod prp;
pub mod report;
pub mod scaffold;
pub mod stack;
pub mod summary;
pub mod transcript;
