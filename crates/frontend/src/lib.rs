//! Marquee Frontend
//!
//! The launcher process around the layout engine.
//!
//! Responsibilities:
//! - Load configuration and the layout file
//! - Own the application state and run the frame loop
//! - Map key presses and IPC commands to navigation
//! - Dispatch card commands: internal `:` commands or program launches
//! - Render through the terminal preview compositor

pub mod app;
pub mod commands;
pub mod config;
pub mod input;
pub mod layout_file;
pub mod server;
pub mod terminal;
