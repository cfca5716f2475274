pub mod auth;
pub mod config;
pub mod detail;
pub mod directory;
pub mod engine;
pub mod formatter;
pub mod graph;
pub mod models;
pub mod report;
