//! JSON Schema objects.
//!
//! Schemas nest arbitrarily deep, so they are converted from the parsed JSON tree by hand
//! instead of through derived `Deserialize` impls: each nesting level costs a handful of
//! small frames rather than a derive state machine plus a buffered copy of the subtree.

use super::{Discriminator, Extensions, ExternalDocs, SchemaRef};
use crate::constants;
use crate::reference::{Pointer, Reference};
use indexmap::IndexMap;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// A JSON Schema: `true`/`false` (3.1) or a keyword object
#[derive(Debug)]
pub enum Schema {
    Bool(bool),
    Object(Box<SchemaObject>),
}

impl Default for Schema {
    fn default() -> Self {
        Self::Object(Box::default())
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_json(Value::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

impl Schema {
    /// Converts a parsed JSON value into a schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither an object nor a boolean, or if a keyword
    /// has the wrong shape.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Bool(accept) => Ok(Self::Bool(accept)),
            Value::Object(map) => SchemaObject::from_map(map).map(Self::Object),
            other => Err(serde_json::Error::custom(format!(
                "schema must be an object or a boolean, found {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Self::Object(object) => Some(object),
            Self::Bool(_) => None,
        }
    }

    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Whether `null` is an acceptable instance
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Bool(accept) => *accept,
            Self::Object(object) => object.is_nullable(),
        }
    }
}

/// `type` is a single name in 3.0 and may be a list in 3.1
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Single(single) => single == name,
            Self::Multiple(names) => names.iter().any(|n| n == name),
        }
    }
}

#[derive(Debug, Default)]
pub struct SchemaObject {
    pub schema_type: Option<SchemaType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    pub default: Option<Value>,
    pub nullable: Option<bool>,
    pub read_only: Option<bool>,
    pub write_only: Option<bool>,
    pub deprecated: Option<bool>,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,

    pub multiple_of: Option<f64>,
    pub maximum: Option<f64>,
    /// Boolean in 3.0, number in 3.1
    pub exclusive_maximum: Option<Value>,
    pub minimum: Option<f64>,
    pub exclusive_minimum: Option<Value>,
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<String>,

    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: Option<bool>,
    pub max_contains: Option<u64>,
    pub min_contains: Option<u64>,
    pub max_properties: Option<u64>,
    pub min_properties: Option<u64>,
    pub required: Vec<String>,
    pub dependent_required: IndexMap<String, Vec<String>>,
    pub properties: IndexMap<String, SchemaRef>,
    pub additional_properties: Option<SchemaRef>,
    pub pattern_properties: IndexMap<String, SchemaRef>,
    pub property_names: Option<SchemaRef>,
    pub unevaluated_properties: Option<SchemaRef>,
    pub dependent_schemas: IndexMap<String, SchemaRef>,
    pub items: Option<SchemaRef>,
    pub prefix_items: Vec<SchemaRef>,
    pub unevaluated_items: Option<SchemaRef>,
    pub contains: Option<SchemaRef>,
    pub all_of: Vec<SchemaRef>,
    pub one_of: Vec<SchemaRef>,
    pub any_of: Vec<SchemaRef>,
    pub not: Option<SchemaRef>,
    pub if_schema: Option<SchemaRef>,
    pub then_schema: Option<SchemaRef>,
    pub else_schema: Option<SchemaRef>,
    pub defs: IndexMap<String, SchemaRef>,

    pub discriminator: Option<Discriminator>,
    pub external_docs: Option<ExternalDocs>,
    pub xml: Option<Value>,
    pub example: Option<Value>,
    pub examples: Option<Value>,
    pub content_encoding: Option<String>,
    pub content_media_type: Option<String>,
    pub id: Option<String>,
    pub dialect: Option<String>,
    pub anchor: Option<String>,
    pub comment: Option<String>,
    pub extensions: Extensions,
}

impl SchemaObject {
    /// `nullable: true` (3.0) or a `type` list containing `null` (3.1)
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable == Some(true)
            || self
                .schema_type
                .as_ref()
                .is_some_and(|types| types.contains("null"))
    }

    #[must_use]
    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|name| name == property)
    }
}

impl SchemaObject {
    fn from_map(map: Map<String, Value>) -> Result<Box<Self>, serde_json::Error> {
        let mut object = Box::<Self>::default();
        let mut unmodelled = IndexMap::new();
        for (key, value) in map {
            if let Some(value) = object.set_keyword(&key, value)? {
                unmodelled.insert(key, value);
            }
        }
        object.extensions = Extensions::from_map(unmodelled);
        Ok(object)
    }

    /// Stores one keyword; hands the value back when the keyword is not modelled
    fn set_keyword(&mut self, key: &str, value: Value) -> Result<Option<Value>, serde_json::Error> {
        match key {
            "type" => self.schema_type = leaf(key, value)?,
            "title" => self.title = leaf(key, value)?,
            constants::FIELD_DESCRIPTION => self.description = leaf(key, value)?,
            "format" => self.format = leaf(key, value)?,
            constants::FIELD_DEFAULT => self.default = leaf(key, value)?,
            "nullable" => self.nullable = leaf(key, value)?,
            "readOnly" => self.read_only = leaf(key, value)?,
            "writeOnly" => self.write_only = leaf(key, value)?,
            "deprecated" => self.deprecated = leaf(key, value)?,
            "enum" => self.enum_values = leaf(key, value)?,
            "const" => self.const_value = leaf(key, value)?,
            "multipleOf" => self.multiple_of = leaf(key, value)?,
            "maximum" => self.maximum = leaf(key, value)?,
            "exclusiveMaximum" => self.exclusive_maximum = leaf(key, value)?,
            "minimum" => self.minimum = leaf(key, value)?,
            "exclusiveMinimum" => self.exclusive_minimum = leaf(key, value)?,
            "maxLength" => self.max_length = leaf(key, value)?,
            "minLength" => self.min_length = leaf(key, value)?,
            "pattern" => self.pattern = leaf(key, value)?,
            "maxItems" => self.max_items = leaf(key, value)?,
            "minItems" => self.min_items = leaf(key, value)?,
            "uniqueItems" => self.unique_items = leaf(key, value)?,
            "maxContains" => self.max_contains = leaf(key, value)?,
            "minContains" => self.min_contains = leaf(key, value)?,
            "maxProperties" => self.max_properties = leaf(key, value)?,
            "minProperties" => self.min_properties = leaf(key, value)?,
            "required" => self.required = leaf(key, value)?,
            "dependentRequired" => self.dependent_required = leaf(key, value)?,
            constants::FIELD_PROPERTIES => self.properties = schema_map(key, value)?,
            constants::FIELD_ADDITIONAL_PROPERTIES => {
                self.additional_properties = optional_schema(value)?;
            }
            constants::FIELD_PATTERN_PROPERTIES => {
                self.pattern_properties = schema_map(key, value)?;
            }
            constants::FIELD_PROPERTY_NAMES => self.property_names = optional_schema(value)?,
            constants::FIELD_UNEVALUATED_PROPERTIES => {
                self.unevaluated_properties = optional_schema(value)?;
            }
            constants::FIELD_DEPENDENT_SCHEMAS => {
                self.dependent_schemas = schema_map(key, value)?;
            }
            constants::FIELD_ITEMS => self.items = optional_schema(value)?,
            constants::FIELD_PREFIX_ITEMS => self.prefix_items = schema_list(key, value)?,
            constants::FIELD_UNEVALUATED_ITEMS => self.unevaluated_items = optional_schema(value)?,
            constants::FIELD_CONTAINS => self.contains = optional_schema(value)?,
            constants::FIELD_ALL_OF => self.all_of = schema_list(key, value)?,
            constants::FIELD_ONE_OF => self.one_of = schema_list(key, value)?,
            constants::FIELD_ANY_OF => self.any_of = schema_list(key, value)?,
            constants::FIELD_NOT => self.not = optional_schema(value)?,
            constants::FIELD_IF => self.if_schema = optional_schema(value)?,
            constants::FIELD_THEN => self.then_schema = optional_schema(value)?,
            constants::FIELD_ELSE => self.else_schema = optional_schema(value)?,
            constants::FIELD_DEFS => self.defs = schema_map(key, value)?,
            constants::FIELD_DISCRIMINATOR => self.discriminator = leaf(key, value)?,
            constants::FIELD_EXTERNAL_DOCS => self.external_docs = leaf(key, value)?,
            "xml" => self.xml = leaf(key, value)?,
            constants::FIELD_EXAMPLE => self.example = leaf(key, value)?,
            constants::FIELD_EXAMPLES => self.examples = leaf(key, value)?,
            "contentEncoding" => self.content_encoding = leaf(key, value)?,
            "contentMediaType" => self.content_media_type = leaf(key, value)?,
            "$id" => self.id = leaf(key, value)?,
            "$schema" => self.dialect = leaf(key, value)?,
            "$anchor" => self.anchor = leaf(key, value)?,
            "$comment" => self.comment = leaf(key, value)?,
            _ => return Ok(Some(value)),
        }
        Ok(None)
    }
}

/// A keyword whose value holds no schemas
fn leaf<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value).map_err(|e| serde_json::Error::custom(format!("{key}: {e}")))
}

/// Converts one schema position, which may hold a `$ref`
pub(crate) fn schema_ref(value: Value) -> Result<SchemaRef, serde_json::Error> {
    if let Value::Object(map) = &value {
        if let Some(pointer) = Pointer::from_object(map) {
            return Ok(Reference::Pointer(pointer));
        }
    }
    Schema::from_json(value).map(Reference::Inline)
}

fn optional_schema(value: Value) -> Result<Option<SchemaRef>, serde_json::Error> {
    match value {
        Value::Null => Ok(None),
        value => schema_ref(value).map(Some),
    }
}

fn schema_list(key: &str, value: Value) -> Result<Vec<SchemaRef>, serde_json::Error> {
    match value {
        Value::Array(items) => items.into_iter().map(schema_ref).collect(),
        other => Err(serde_json::Error::custom(format!(
            "{key}: expected a list of schemas, found {other}"
        ))),
    }
}

fn schema_map(key: &str, value: Value) -> Result<IndexMap<String, SchemaRef>, serde_json::Error> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(name, value)| schema_ref(value).map(|schema| (name, schema)))
            .collect(),
        other => Err(serde_json::Error::custom(format!(
            "{key}: expected a map of schemas, found {other}"
        ))),
    }
}
