//! confwiz CLI - the `confwiz` command
//!
//! - [`commands`]: `new`, `edit`, `validate`, `show-schema` and `list`
//! - [`terminal`]: line-oriented [`Prompter`](confwiz_core::Prompter) for
//!   an interactive terminal
//! - [`display`]: tables and status lines

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod commands;
pub mod display;
pub mod terminal;

pub use commands::{Outcome, Session};
pub use terminal::TerminalPrompter;
