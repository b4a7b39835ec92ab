//! Declared DTO shapes, compiled once at configuration time.
//!
//! A [`DtoSchema`] wraps a compiled JSON Schema validator. Compiling is not
//! cheap, so it happens exactly once when the controllers are constructed and
//! the result is shared behind an `Arc` for the life of the process.

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;

/// One field-level schema violation, carried in the error response `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted path to the offending field; empty for whole-body problems.
    pub field: String,
    pub message: String,
}

/// A named, compiled request-body schema.
#[derive(Debug)]
pub struct DtoSchema {
    name: &'static str,
    validator: Validator,
}

impl DtoSchema {
    /// Compiles `schema`, failing startup on a malformed declaration.
    pub fn compile(name: &'static str, schema: &Value) -> Result<Self, ConfigError> {
        let validator = jsonschema::validator_for(schema).map_err(|e| ConfigError::InvalidSchema {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { name, validator })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Checks raw body bytes against the schema.
    ///
    /// A body that is not JSON at all is reported as a single whole-body
    /// violation rather than a decode error; from the client's point of view
    /// both are the same malformed input.
    pub fn check(&self, body: &[u8]) -> Result<Value, Vec<Violation>> {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                return Err(vec![Violation {
                    field: String::new(),
                    message: format!("body is not valid json: {e}"),
                }])
            }
        };

        let violations: Vec<Violation> = self
            .validator
            .iter_errors(&value)
            .map(|err| {
                let field = match &err.kind {
                    // point at the missing property, not at its parent object
                    ValidationErrorKind::Required { property } => {
                        let parent = dotted(&err.instance_path.to_string());
                        let name = property.as_str().unwrap_or_default();
                        if parent.is_empty() {
                            name.to_owned()
                        } else {
                            format!("{parent}.{name}")
                        }
                    }
                    _ => dotted(&err.instance_path.to_string()),
                };
                Violation { field, message: err.to_string() }
            })
            .collect();

        if violations.is_empty() {
            Ok(value)
        } else {
            Err(violations)
        }
    }
}

fn dotted(pointer: &str) -> String {
    pointer.trim_start_matches('/').replace('/', ".")
}
