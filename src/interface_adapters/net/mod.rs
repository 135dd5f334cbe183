// Websocket connection handling for game clients.

pub mod client;

pub use client::ws_handler;
