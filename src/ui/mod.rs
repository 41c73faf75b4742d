//! Terminal plumbing for the interactive wizard.

pub mod terminal_guard;

pub use terminal_guard::TerminalGuard;
