//! Chat command surface
//!
//! Turns Telegram updates into workflow calls and renders the outcome back
//! as HTML chat messages.

pub mod commands;
pub mod dispatcher;
pub mod render;
pub mod runner;

pub use commands::{Command, ParseError};
pub use dispatcher::{Dispatcher, Sender};
pub use runner::Bot;
