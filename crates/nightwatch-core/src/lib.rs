// Library root: the spectator pipeline from raw server frames to view
// updates. The terminal front end lives in the nightwatch-tui crate.

pub mod app;
pub mod commands;
pub mod config;
pub mod decoder;
pub mod protocol;
pub mod render;
pub mod state;
pub mod timers;
pub mod ws_client;
