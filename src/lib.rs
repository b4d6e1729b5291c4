pub mod app;
pub mod capture;
pub mod card;
pub mod cli;
pub mod config;
pub mod media;
pub mod post;
pub mod richtext;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
