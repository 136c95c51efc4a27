use super::{Extensions, Schema};
use crate::constants;
use crate::reference::Reference;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub type SchemaRef = Reference<Schema>;
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Root object of an `OpenAPI` document
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub openapi: Option<String>,
    pub info: Option<Info>,
    pub json_schema_dialect: Option<String>,
    #[serde(default)]
    pub servers: Vec<Server>,
    pub paths: Option<Paths>,
    #[serde(default)]
    pub webhooks: IndexMap<String, Reference<PathItem>>,
    pub components: Option<Components>,
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub external_docs: Option<ExternalDocs>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub terms_of_service: Option<String>,
    pub contact: Option<Contact>,
    pub license: Option<License>,
    pub version: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
pub struct License {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub url: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
pub struct Server {
    #[serde(default)]
    pub url: String,
    pub description: Option<String>,
    #[serde(default)]
    pub variables: IndexMap<String, ServerVariable>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerVariable {
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,
    pub default: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// The `paths` map; `x-` keys are split off into extensions
#[derive(Debug, Default)]
pub struct Paths {
    pub paths: IndexMap<String, Reference<PathItem>>,
    pub extensions: Extensions,
}

impl Paths {
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Reference<PathItem>> {
        self.paths.get(path)
    }
}

impl<'de> Deserialize<'de> for Paths {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (paths, extensions) = split_extensions(deserializer)?;
        Ok(Self { paths, extensions })
    }
}

/// Splits a map into typed entries and `x-` extensions
fn split_extensions<'de, D, T>(
    deserializer: D,
) -> Result<(IndexMap<String, T>, Extensions), D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
    let mut entries = IndexMap::with_capacity(raw.len());
    let mut extensions = IndexMap::new();
    for (key, value) in raw {
        if key.starts_with(constants::EXTENSION_PREFIX) {
            extensions.insert(key, value);
        } else {
            let entry = serde_json::from_value(value)
                .map_err(|e| serde::de::Error::custom(format!("{key}: {e}")))?;
            entries.insert(key, entry);
        }
    }
    Ok((entries, Extensions::from_map(extensions)))
}

#[derive(Debug, Default, Deserialize)]
pub struct PathItem {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub parameters: Vec<Reference<Parameter>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl PathItem {
    /// Operations in document order of the HTTP methods
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("get", &self.get),
            ("put", &self.put),
            ("post", &self.post),
            ("delete", &self.delete),
            ("options", &self.options),
            ("head", &self.head),
            ("patch", &self.patch),
            ("trace", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub external_docs: Option<ExternalDocs>,
    pub operation_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Reference<Parameter>>,
    pub request_body: Option<Reference<RequestBody>>,
    pub responses: Option<Responses>,
    #[serde(default)]
    pub callbacks: IndexMap<String, Reference<Callback>>,
    pub deprecated: Option<bool>,
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
    pub deprecated: Option<bool>,
    pub allow_empty_value: Option<bool>,
    pub style: Option<String>,
    pub explode: Option<bool>,
    pub allow_reserved: Option<bool>,
    pub schema: Option<SchemaRef>,
    pub example: Option<Value>,
    #[serde(default)]
    pub examples: IndexMap<String, Reference<Example>>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestBody {
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
    pub required: Option<bool>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaType {
    pub schema: Option<SchemaRef>,
    pub example: Option<Value>,
    #[serde(default)]
    pub examples: IndexMap<String, Reference<Example>>,
    #[serde(default)]
    pub encoding: IndexMap<String, Encoding>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encoding {
    pub content_type: Option<String>,
    #[serde(default)]
    pub headers: IndexMap<String, Reference<Header>>,
    pub style: Option<String>,
    pub explode: Option<bool>,
    pub allow_reserved: Option<bool>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// The `responses` map of an operation; status codes keep their string form
#[derive(Debug, Default)]
pub struct Responses {
    pub default: Option<Reference<Response>>,
    pub responses: IndexMap<String, Reference<Response>>,
    pub extensions: Extensions,
}

impl Responses {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.responses.is_empty()
    }
}

impl<'de> Deserialize<'de> for Responses {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (mut responses, extensions) = split_extensions(deserializer)?;
        let default = responses.shift_remove(constants::FIELD_DEFAULT);
        Ok(Self {
            default,
            responses,
            extensions,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Response {
    pub description: Option<String>,
    #[serde(default)]
    pub headers: IndexMap<String, Reference<Header>>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
    #[serde(default)]
    pub links: IndexMap<String, Reference<Link>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
pub struct Header {
    pub description: Option<String>,
    pub required: Option<bool>,
    pub deprecated: Option<bool>,
    pub style: Option<String>,
    pub explode: Option<bool>,
    pub schema: Option<SchemaRef>,
    pub example: Option<Value>,
    #[serde(default)]
    pub examples: IndexMap<String, Reference<Example>>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub value: Option<Value>,
    pub external_value: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub operation_ref: Option<String>,
    pub operation_id: Option<String>,
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
    pub request_body: Option<Value>,
    pub description: Option<String>,
    pub server: Option<Server>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Runtime expression to path item map
#[derive(Debug, Default)]
pub struct Callback {
    pub expressions: IndexMap<String, Reference<PathItem>>,
    pub extensions: Extensions,
}

impl<'de> Deserialize<'de> for Callback {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (expressions, extensions) = split_extensions(deserializer)?;
        Ok(Self {
            expressions,
            extensions,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaRef>,
    #[serde(default)]
    pub responses: IndexMap<String, Reference<Response>>,
    #[serde(default)]
    pub parameters: IndexMap<String, Reference<Parameter>>,
    #[serde(default)]
    pub examples: IndexMap<String, Reference<Example>>,
    #[serde(default)]
    pub request_bodies: IndexMap<String, Reference<RequestBody>>,
    #[serde(default)]
    pub headers: IndexMap<String, Reference<Header>>,
    #[serde(default)]
    pub security_schemes: IndexMap<String, Reference<SecurityScheme>>,
    #[serde(default)]
    pub links: IndexMap<String, Reference<Link>>,
    #[serde(default)]
    pub callbacks: IndexMap<String, Reference<Callback>>,
    #[serde(default)]
    pub path_items: IndexMap<String, Reference<PathItem>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: Option<String>,
    pub description: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
    pub flows: Option<OAuthFlows>,
    pub open_id_connect_url: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    pub implicit: Option<OAuthFlow>,
    pub password: Option<OAuthFlow>,
    pub client_credentials: Option<OAuthFlow>,
    pub authorization_code: Option<OAuthFlow>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: Option<String>,
    pub description: Option<String>,
    pub external_docs: Option<ExternalDocs>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExternalDocs {
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: Option<String>,
    #[serde(default)]
    pub mapping: IndexMap<String, String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_responses_split_default_and_extensions() {
        let responses: Responses = serde_json::from_value(json!({
            "200": {"description": "ok"},
            "default": {"$ref": "#/components/responses/Error"},
            "x-internal": true
        }))
        .unwrap();
        assert!(responses.default.as_ref().is_some_and(Reference::is_pointer));
        assert_eq!(responses.responses.len(), 1);
        assert_eq!(responses.extensions.vendor().count(), 1);
    }

    #[test]
    fn test_path_item_operations_order() {
        let item: PathItem = serde_json::from_value(json!({
            "post": {"responses": {"201": {"description": "created"}}},
            "get": {"responses": {"200": {"description": "ok"}}}
        }))
        .unwrap();
        let methods: Vec<&str> = item.operations().map(|(m, _)| m).collect();
        assert_eq!(methods, vec!["get", "post"]);
    }

    #[test]
    fn test_parameter_keeps_unknown_fields() {
        let parameter: Parameter = serde_json::from_value(json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": {"type": "string"},
            "nullable": true
        }))
        .unwrap();
        assert_eq!(parameter.location.as_deref(), Some("path"));
        let unknown: Vec<&str> = parameter.extensions.unknown_fields().collect();
        assert_eq!(unknown, vec!["nullable"]);
    }
}
