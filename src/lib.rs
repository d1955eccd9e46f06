pub mod api;
pub mod batch;
pub mod checks;
pub mod config;
pub mod content;
pub mod decoder;
pub mod history;
pub mod humanize;
pub mod observability;
pub mod render;
