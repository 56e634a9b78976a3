pub mod core;
pub mod dashboard;
pub mod format;
pub mod notify;
pub mod theme;
