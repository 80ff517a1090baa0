pub mod api;
pub mod code;
pub mod config;
pub mod dirs;
pub mod display;
pub mod logs;
pub mod rsa;
