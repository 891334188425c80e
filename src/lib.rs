pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod logging;
pub mod question;
pub mod result;
pub mod runtime;
pub mod session;
pub mod shuffle;
pub mod source;
pub mod store;
pub mod ui;
