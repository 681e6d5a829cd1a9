//! Core of the HBNB command console.
//! Owns the entity registry, the record model, the JSON file store and the
//! command interpreter; the `console` binary only wires them to stdio.

pub mod config;
pub mod console;
pub mod logging;
pub mod model;
pub mod storage;

pub use config::{ConfigError, ConsoleConfig};
pub use console::{
    run_session, CommandOutcome, Console, ConsoleError, ConsoleResult, SharedStore, PROMPT,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{Record, RecordDecodeError, RecordId};
pub use model::registry::{EntityRegistry, EntitySchema, RegistryError};
pub use model::value::{AttrType, AttrValue, AttributeMap};
pub use storage::{FileStorage, RecordStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
