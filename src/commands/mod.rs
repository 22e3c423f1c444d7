//! Command parsing for devpanel.
//!
//! Turns typed input lines into [`Command`] values. Parsing needs no device and no
//! terminal, so it is tested on its own.

pub mod help;
pub mod router;
pub mod tokenizer;

pub use router::{Command, CommandRouter, ConnectArgs};
pub use tokenizer::split_commands;
