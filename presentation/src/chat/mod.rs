//! Interactive consultation module
//!
//! Provides a readline-based interface where every line is one round.

mod repl;

pub use repl::ChatRepl;
