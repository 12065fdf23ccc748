pub mod actions;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data;
pub mod db;
pub mod format;
pub mod logging;
pub mod models;
pub mod seed;
pub mod ui;
pub mod validation;
