//! Centralized string constants for refscope
//!
//! Field names are the serialized `OpenAPI` keys, so they double as JSON pointer segments.

// Document-level fields
pub const FIELD_OPENAPI: &str = "openapi";
pub const FIELD_INFO: &str = "info";
pub const FIELD_SERVERS: &str = "servers";
pub const FIELD_PATHS: &str = "paths";
pub const FIELD_WEBHOOKS: &str = "webhooks";
pub const FIELD_COMPONENTS: &str = "components";
pub const FIELD_TAGS: &str = "tags";
pub const FIELD_EXTERNAL_DOCS: &str = "externalDocs";

// Object fields
pub const FIELD_CONTACT: &str = "contact";
pub const FIELD_LICENSE: &str = "license";
pub const FIELD_VARIABLES: &str = "variables";
pub const FIELD_PARAMETERS: &str = "parameters";
pub const FIELD_REQUEST_BODY: &str = "requestBody";
pub const FIELD_RESPONSES: &str = "responses";
pub const FIELD_CALLBACKS: &str = "callbacks";
pub const FIELD_CONTENT: &str = "content";
pub const FIELD_SCHEMA: &str = "schema";
pub const FIELD_EXAMPLES: &str = "examples";
pub const FIELD_EXAMPLE: &str = "example";
pub const FIELD_ENCODING: &str = "encoding";
pub const FIELD_HEADERS: &str = "headers";
pub const FIELD_LINKS: &str = "links";
pub const FIELD_SERVER: &str = "server";
pub const FIELD_FLOWS: &str = "flows";
pub const FIELD_IMPLICIT: &str = "implicit";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_CLIENT_CREDENTIALS: &str = "clientCredentials";
pub const FIELD_AUTHORIZATION_CODE: &str = "authorizationCode";
pub const FIELD_DEFAULT: &str = "default";

// Schema keywords
pub const FIELD_PROPERTIES: &str = "properties";
pub const FIELD_ADDITIONAL_PROPERTIES: &str = "additionalProperties";
pub const FIELD_PATTERN_PROPERTIES: &str = "patternProperties";
pub const FIELD_ITEMS: &str = "items";
pub const FIELD_PREFIX_ITEMS: &str = "prefixItems";
pub const FIELD_ALL_OF: &str = "allOf";
pub const FIELD_ONE_OF: &str = "oneOf";
pub const FIELD_ANY_OF: &str = "anyOf";
pub const FIELD_NOT: &str = "not";
pub const FIELD_IF: &str = "if";
pub const FIELD_THEN: &str = "then";
pub const FIELD_ELSE: &str = "else";
pub const FIELD_CONTAINS: &str = "contains";
pub const FIELD_PROPERTY_NAMES: &str = "propertyNames";
pub const FIELD_DEPENDENT_SCHEMAS: &str = "dependentSchemas";
pub const FIELD_UNEVALUATED_PROPERTIES: &str = "unevaluatedProperties";
pub const FIELD_UNEVALUATED_ITEMS: &str = "unevaluatedItems";
pub const FIELD_DEFS: &str = "$defs";
pub const FIELD_DISCRIMINATOR: &str = "discriminator";
pub const FIELD_REF: &str = "$ref";
pub const FIELD_SUMMARY: &str = "summary";
pub const FIELD_DESCRIPTION: &str = "description";

// Reusable component sections
pub const COMPONENT_SCHEMAS: &str = "schemas";
pub const COMPONENT_RESPONSES: &str = "responses";
pub const COMPONENT_PARAMETERS: &str = "parameters";
pub const COMPONENT_EXAMPLES: &str = "examples";
pub const COMPONENT_REQUEST_BODIES: &str = "requestBodies";
pub const COMPONENT_HEADERS: &str = "headers";
pub const COMPONENT_SECURITY_SCHEMES: &str = "securitySchemes";
pub const COMPONENT_LINKS: &str = "links";
pub const COMPONENT_CALLBACKS: &str = "callbacks";
pub const COMPONENT_PATH_ITEMS: &str = "pathItems";

// Extension prefix
pub const EXTENSION_PREFIX: &str = "x-";

// Diagnostic rule identifiers
pub const RULE_REQUIRED_FIELD_MISSING: &str = "required-field-missing";
pub const RULE_MUTUALLY_EXCLUSIVE_FIELDS: &str = "mutually-exclusive-fields";
pub const RULE_UNKNOWN_FIELD: &str = "unknown-field";
pub const RULE_INVALID_REFERENCE: &str = "invalid-reference";
pub const RULE_UNRESOLVED_REFERENCE: &str = "unresolved-reference";
pub const RULE_CIRCULAR_REFERENCE: &str = "circular-reference";
pub const RULE_INVALID_CIRCULAR_SCHEMA: &str = "invalid-circular-schema";
pub const RULE_REF_SIBLINGS_IGNORED: &str = "ref-siblings-ignored";
pub const RULE_INVALID_VERSION: &str = "invalid-version";

// Environment Variables
pub const ENV_REFSCOPE_CONFIG_DIR: &str = "REFSCOPE_CONFIG_DIR";
pub const ENV_REFSCOPE_LOG: &str = "REFSCOPE_LOG";
pub const ENV_REFSCOPE_LOG_FORMAT: &str = "REFSCOPE_LOG_FORMAT";
pub const ENV_REFSCOPE_LOG_FILE: &str = "REFSCOPE_LOG_FILE";

// Config file
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CONFIG_DIR_NAME: &str = "refscope";

// Error Context Messages
pub const ERR_FILE_NOT_FOUND: &str = "Check that the file path is correct and the file exists.";
pub const ERR_PERMISSION: &str = "Check file permissions or run with appropriate privileges.";
pub const ERR_YAML_SYNTAX: &str = "Check that your OpenAPI document is valid YAML syntax.";
pub const ERR_JSON_SYNTAX: &str = "Check that your OpenAPI document is valid JSON syntax.";
pub const ERR_TOML_SYNTAX: &str = "Check that your configuration file is valid TOML syntax.";
