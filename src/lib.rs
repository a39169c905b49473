pub mod backend;
pub mod banner;
pub mod commands;
pub mod config;
pub mod connect;
pub mod consts;
pub mod error;
pub mod identity;
pub mod provider;
pub mod spinner;
pub mod window;
