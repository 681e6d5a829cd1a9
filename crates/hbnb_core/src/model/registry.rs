//! Entity kind registry.
//!
//! # Responsibility
//! - Map entity kind names to their attribute schemas.
//! - Supply schema defaults for new records and declared types for updates.
//!
//! # Invariants
//! - Kind names are unique, non-empty identifiers without `.`.
//! - The built-in registry is read-only after first use.

use crate::model::value::{AttrType, AttributeMap};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One declared attribute of an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub ty: AttrType,
}

impl AttributeSpec {
    pub const fn new(name: &'static str, ty: AttrType) -> Self {
        Self { name, ty }
    }
}

/// Attribute schema for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    pub kind: &'static str,
    pub attributes: &'static [AttributeSpec],
}

impl EntitySchema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|spec| spec.name == name)
    }

    /// Default attribute values in declaration order.
    pub fn defaults(&self) -> AttributeMap {
        self.attributes
            .iter()
            .map(|spec| (spec.name.to_string(), spec.ty.default_value()))
            .collect()
    }
}

const fn string(name: &'static str) -> AttributeSpec {
    AttributeSpec::new(name, AttrType::Str)
}

const fn integer(name: &'static str) -> AttributeSpec {
    AttributeSpec::new(name, AttrType::Int)
}

const fn float(name: &'static str) -> AttributeSpec {
    AttributeSpec::new(name, AttrType::Float)
}

const fn string_list(name: &'static str) -> AttributeSpec {
    AttributeSpec::new(name, AttrType::StrList)
}

static BUILTIN_SCHEMAS: &[EntitySchema] = &[
    EntitySchema {
        kind: "BaseModel",
        attributes: &[],
    },
    EntitySchema {
        kind: "User",
        attributes: &[
            string("email"),
            string("password"),
            string("first_name"),
            string("last_name"),
        ],
    },
    EntitySchema {
        kind: "State",
        attributes: &[string("name")],
    },
    EntitySchema {
        kind: "City",
        attributes: &[string("state_id"), string("name")],
    },
    EntitySchema {
        kind: "Amenity",
        attributes: &[string("name")],
    },
    EntitySchema {
        kind: "Place",
        attributes: &[
            string("city_id"),
            string("user_id"),
            string("name"),
            string("description"),
            integer("number_rooms"),
            integer("number_bathrooms"),
            integer("max_guest"),
            integer("price_by_night"),
            float("latitude"),
            float("longitude"),
            string_list("amenity_ids"),
        ],
    },
    EntitySchema {
        kind: "Review",
        attributes: &[string("place_id"), string("user_id"), string("text")],
    },
];

static BUILTIN_REGISTRY: Lazy<EntityRegistry> = Lazy::new(|| {
    EntityRegistry::new(BUILTIN_SCHEMAS).expect("built-in entity schemas are valid")
});

/// Registry construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidKindName(String),
    DuplicateKind(String),
    DuplicateAttribute { kind: String, attribute: String },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKindName(kind) => write!(f, "entity kind name is invalid: `{kind}`"),
            Self::DuplicateKind(kind) => write!(f, "entity kind already registered: {kind}"),
            Self::DuplicateAttribute { kind, attribute } => {
                write!(f, "entity kind {kind} declares `{attribute}` twice")
            }
        }
    }
}

impl Error for RegistryError {}

/// Lookup table from kind name to schema.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    order: Vec<&'static str>,
    schemas: BTreeMap<&'static str, &'static EntitySchema>,
}

impl EntityRegistry {
    /// Builds a registry, validating kind names and attribute uniqueness.
    pub fn new(schemas: &'static [EntitySchema]) -> Result<Self, RegistryError> {
        let mut order = Vec::with_capacity(schemas.len());
        let mut by_kind = BTreeMap::new();

        for schema in schemas {
            if !is_valid_kind_name(schema.kind) {
                return Err(RegistryError::InvalidKindName(schema.kind.to_string()));
            }
            if by_kind.insert(schema.kind, schema).is_some() {
                return Err(RegistryError::DuplicateKind(schema.kind.to_string()));
            }
            for (index, spec) in schema.attributes.iter().enumerate() {
                if schema.attributes[..index]
                    .iter()
                    .any(|earlier| earlier.name == spec.name)
                {
                    return Err(RegistryError::DuplicateAttribute {
                        kind: schema.kind.to_string(),
                        attribute: spec.name.to_string(),
                    });
                }
            }
            order.push(schema.kind);
        }

        Ok(Self {
            order,
            schemas: by_kind,
        })
    }

    /// The fixed set of kinds the console manages.
    pub fn builtin() -> &'static EntityRegistry {
        &BUILTIN_REGISTRY
    }

    pub fn lookup(&self, kind: &str) -> Option<&'static EntitySchema> {
        self.schemas.get(kind).copied()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.schemas.contains_key(kind)
    }

    /// Kind names in declaration order.
    pub fn kind_names(&self) -> &[&'static str] {
        &self.order
    }
}

fn is_valid_kind_name(kind: &str) -> bool {
    !kind.is_empty()
        && kind
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::{AttributeSpec, EntityRegistry, EntitySchema, RegistryError};
    use crate::model::value::{AttrType, AttrValue};

    #[test]
    fn builtin_registry_knows_every_kind_in_order() {
        let registry = EntityRegistry::builtin();
        assert_eq!(
            registry.kind_names(),
            &["BaseModel", "User", "State", "City", "Amenity", "Place", "Review"]
        );
        assert!(registry.lookup("Country").is_none());
        assert!(registry.lookup("user").is_none());
    }

    #[test]
    fn place_schema_declares_typed_defaults() {
        let place = EntityRegistry::builtin().lookup("Place").unwrap();
        let defaults = place.defaults();

        assert_eq!(defaults.get("number_rooms"), Some(&AttrValue::Int(0)));
        assert_eq!(defaults.get("latitude"), Some(&AttrValue::Float(0.0)));
        assert_eq!(defaults.get("amenity_ids"), Some(&AttrValue::StrList(Vec::new())));
        assert_eq!(defaults.get("name"), Some(&AttrValue::Str(String::new())));
        assert_eq!(place.attribute("max_guest").map(|spec| spec.ty), Some(AttrType::Int));
    }

    #[test]
    fn new_rejects_duplicate_kinds() {
        static SCHEMAS: &[EntitySchema] = &[
            EntitySchema {
                kind: "Thing",
                attributes: &[],
            },
            EntitySchema {
                kind: "Thing",
                attributes: &[],
            },
        ];
        let err = EntityRegistry::new(SCHEMAS).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateKind("Thing".to_string()));
    }

    #[test]
    fn new_rejects_dotted_kind_names_and_repeated_attributes() {
        static DOTTED: &[EntitySchema] = &[EntitySchema {
            kind: "a.b",
            attributes: &[],
        }];
        assert!(matches!(
            EntityRegistry::new(DOTTED),
            Err(RegistryError::InvalidKindName(_))
        ));

        static REPEATED: &[EntitySchema] = &[EntitySchema {
            kind: "Thing",
            attributes: &[
                AttributeSpec::new("name", AttrType::Str),
                AttributeSpec::new("name", AttrType::Int),
            ],
        }];
        assert!(matches!(
            EntityRegistry::new(REPEATED),
            Err(RegistryError::DuplicateAttribute { .. })
        ));
    }
}
