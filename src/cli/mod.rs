mod args;
mod commands;
mod repl;
pub(crate) mod theme;

pub use args::CliArgs;
pub use repl::{AppState, PROMPT, run_repl};
pub use theme::Theme;
