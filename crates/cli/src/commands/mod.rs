//! Command handlers for the bookchat CLI.

pub mod ask;
pub mod check;
pub mod serve;

pub use ask::AskCommand;
pub use check::CheckCommand;
pub use serve::ServeCommand;
