//! Record domain model.
//!
//! # Responsibility
//! - Define the base shape shared by every entity kind: identity, two
//!   timestamps and an open attribute bag.
//! - Convert records to and from their exported (stored) form.
//!
//! # Invariants
//! - `id` is assigned once and never changes.
//! - `created_at` never changes; `updated_at` only moves forward.
//! - `kind + "." + id` is the record's only address.
//! - Reserved names (`id`, `created_at`, `updated_at`, `__class__`) never
//!   appear in the attribute bag.

use crate::model::registry::{EntityRegistry, EntitySchema};
use crate::model::timestamp::{self, format_timestamp, parse_timestamp, py_datetime_repr, Timestamp};
use crate::model::value::{py_str_repr, AttrValue, AttributeMap};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque record identifier. Generated ids are hyphenated UUID v4 text.
pub type RecordId = String;

/// Discriminator key carried by every exported record.
pub const KIND_FIELD: &str = "__class__";

/// Attribute names managed by the record itself.
pub const RESERVED_ATTRIBUTES: &[&str] = &["id", "created_at", "updated_at", KIND_FIELD];

/// Builds the composite index key for a record.
pub fn composite_key(kind: &str, id: &str) -> String {
    format!("{kind}.{id}")
}

pub fn is_reserved_attribute(name: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&name)
}

/// Errors raised while rebuilding a record from its exported form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDecodeError {
    MissingField(&'static str),
    InvalidField { field: String, reason: String },
    UnknownKind(String),
}

impl Display for RecordDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field `{field}`"),
            Self::InvalidField { field, reason } => write!(f, "invalid field `{field}`: {reason}"),
            Self::UnknownKind(kind) => write!(f, "unknown entity kind `{kind}`"),
        }
    }
}

impl Error for RecordDecodeError {}

/// One live entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: String,
    id: RecordId,
    created_at: Timestamp,
    updated_at: Timestamp,
    attributes: AttributeMap,
}

impl Record {
    /// Creates a record of `schema`'s kind with a fresh id, both timestamps
    /// set to now and every schema attribute at its default.
    pub fn new(schema: &EntitySchema) -> Self {
        let created_at = timestamp::now();
        Self {
            kind: schema.kind.to_string(),
            id: Uuid::new_v4().to_string(),
            created_at,
            updated_at: created_at,
            attributes: schema.defaults(),
        }
    }

    /// Rebuilds a record with known identity and timestamps.
    ///
    /// Reserved names in `attributes` are dropped.
    pub fn restore(
        kind: impl Into<String>,
        id: impl Into<RecordId>,
        created_at: Timestamp,
        updated_at: Timestamp,
        attributes: AttributeMap,
    ) -> Self {
        let attributes = attributes
            .iter()
            .filter(|(name, _)| !is_reserved_attribute(name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        Self {
            kind: kind.into(),
            id: id.into(),
            created_at,
            updated_at,
            attributes,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Composite index key (`Kind.id`).
    pub fn key(&self) -> String {
        composite_key(&self.kind, &self.id)
    }

    /// Sets one attribute. Returns `false` (and changes nothing) for
    /// reserved names.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: AttrValue) -> bool {
        let name = name.into();
        if is_reserved_attribute(&name) {
            return false;
        }
        self.attributes.insert(name, value);
        true
    }

    /// Bumps `updated_at` to now, strictly past its previous value.
    pub fn touch(&mut self) {
        let now = timestamp::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }

    /// Exported form: `id`, both timestamps, attributes, then `__class__`.
    pub fn to_export(&self) -> Map<String, Value> {
        let mut exported = Map::new();
        exported.insert("id".to_string(), Value::String(self.id.clone()));
        exported.insert(
            "created_at".to_string(),
            Value::String(format_timestamp(&self.created_at)),
        );
        exported.insert(
            "updated_at".to_string(),
            Value::String(format_timestamp(&self.updated_at)),
        );
        for (name, value) in self.attributes.iter() {
            exported.insert(name.to_string(), attr_to_json(value));
        }
        exported.insert(KIND_FIELD.to_string(), Value::String(self.kind.clone()));
        exported
    }

    /// Rebuilds a record from its exported form.
    ///
    /// # Errors
    /// - `UnknownKind` when `__class__` is not registered.
    /// - `MissingField`/`InvalidField` for absent or malformed identity,
    ///   timestamps, or attribute values outside the four supported shapes.
    pub fn from_export(
        registry: &EntityRegistry,
        exported: &Map<String, Value>,
    ) -> Result<Self, RecordDecodeError> {
        let kind = required_str(exported, KIND_FIELD)?;
        if !registry.contains(kind) {
            return Err(RecordDecodeError::UnknownKind(kind.to_string()));
        }
        let id = required_str(exported, "id")?;
        let created_at = required_timestamp(exported, "created_at")?;
        let updated_at = required_timestamp(exported, "updated_at")?;

        let mut attributes = AttributeMap::new();
        for (name, value) in exported {
            if is_reserved_attribute(name) {
                continue;
            }
            let decoded = serde_json::from_value::<AttrValue>(value.clone()).map_err(|_| {
                RecordDecodeError::InvalidField {
                    field: name.clone(),
                    reason: format!("unsupported value `{value}`"),
                }
            })?;
            attributes.insert(name.clone(), decoded);
        }

        Ok(Self::restore(kind, id, created_at, updated_at, attributes))
    }
}

impl Display for Record {
    /// `[Kind] (id) {'id': ..., 'created_at': ..., 'updated_at': ..., ...}`
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] ({}) {{'id': {}, 'created_at': {}, 'updated_at': {}",
            self.kind,
            self.id,
            py_str_repr(&self.id),
            py_datetime_repr(&self.created_at),
            py_datetime_repr(&self.updated_at)
        )?;
        for (name, value) in self.attributes.iter() {
            write!(f, ", {}: {}", py_str_repr(name), value)?;
        }
        f.write_str("}")
    }
}

fn attr_to_json(value: &AttrValue) -> Value {
    match value {
        AttrValue::Str(text) => Value::String(text.clone()),
        AttrValue::Int(number) => Value::from(*number),
        AttrValue::Float(number) => serde_json::Number::from_f64(*number)
            .map(Value::Number)
            // JSON has no NaN/inf; keep the Python spelling as text.
            .unwrap_or_else(|| Value::String(value.as_text())),
        AttrValue::StrList(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
    }
}

fn required_str<'a>(
    exported: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, RecordDecodeError> {
    match exported.get(field) {
        Some(Value::String(text)) => Ok(text.as_str()),
        Some(other) => Err(RecordDecodeError::InvalidField {
            field: field.to_string(),
            reason: format!("expected string, got `{other}`"),
        }),
        None => Err(RecordDecodeError::MissingField(field)),
    }
}

fn required_timestamp(
    exported: &Map<String, Value>,
    field: &'static str,
) -> Result<Timestamp, RecordDecodeError> {
    let text = required_str(exported, field)?;
    parse_timestamp(text).map_err(|err| RecordDecodeError::InvalidField {
        field: field.to_string(),
        reason: format!("`{text}` is not a timestamp: {err}"),
    })
}
