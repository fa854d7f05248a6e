pub mod api;
pub mod app;
pub mod bot;
pub mod cli;
pub mod config;
pub mod global;
pub mod graph;
pub mod transcripts;
pub mod views;
