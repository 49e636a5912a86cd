// Library root for the whisper-inbox service

pub mod api;
pub mod auth;
pub mod config;
pub mod core;
pub mod engine;
pub mod metrics;
pub mod state;
