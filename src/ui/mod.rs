//! Terminal user interface for the command-line front end.
//!
//! - [`display`]: result, warning and artifact lines
//! - [`progress`]: progress bar fed by operation progress
//! - [`prompt`]: password and confirmation prompts

pub mod display;
pub mod progress;
pub mod prompt;
