//! Client module for the remcon CLI.
//!
//! The client side of the console:
//! - HTTP access to the remote query and command endpoints
//! - The interactive terminal console (transcript, input, status line)

pub mod http;
pub mod tui;

pub use http::ConsoleClient;
