//! Command interpreter.
//!
//! # Responsibility
//! - Turn free-form input lines into canonical verb-form commands.
//! - Dispatch each command against the registry and the record store.
//!
//! # See also
//! - `normalizer` for the dotted-call rewrite rules.

pub mod dispatcher;
pub mod help;
pub mod normalizer;
pub mod payload;
pub mod session;
pub mod tokenizer;

pub use dispatcher::{CommandOutcome, Console, ConsoleError, ConsoleResult, SharedStore};
pub use session::{run_session, PROMPT};
