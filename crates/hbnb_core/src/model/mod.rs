//! Entity model: kinds, records and attribute values.
//!
//! # Responsibility
//! - Define the record shape every entity kind shares.
//! - Keep per-kind attribute schemas in one explicit table.
//!
//! # Invariants
//! - Every record is addressed by `kind + "." + id`.
//! - Attribute values are one of string, integer, float or string list.

pub mod record;
pub mod registry;
pub mod timestamp;
pub mod value;
