pub mod auth;
pub mod check;
pub mod completions;
pub mod config;
pub mod folders;
pub mod notify;
