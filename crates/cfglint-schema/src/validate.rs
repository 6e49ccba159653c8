//! # Schema Validation
//!
//! Structural validation of a decoded config value against a registered
//! schema, producing a [`ValidationReport`] of [`Violation`]s.
//!
//! ## Drafts
//!
//! Config schemas are JSON Schema draft-03 unless they say otherwise. A
//! schema whose `$schema` names draft-04 or later is handed to the
//! `jsonschema` crate; everything else runs through the native draft-03
//! evaluator in [`crate::draft3`]. Either way the caller gets the same
//! violation shape: a JSON Pointer into the instance, a message, a
//! [`ViolationKind`], and for enum failures the allowed values in
//! `details`.
//!
//! ## Failure modes
//!
//! Violations are results, not errors. [`ValidatorError`] is reserved for
//! schemas that cannot be evaluated at all (bad regular expression,
//! self-referencing `$ref` loop, uncompilable later-draft schema). Schemas
//! are trusted, so such an error aborts the run.

use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cfglint_core::SchemaName;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Retrieve, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::registry::{SchemaDocument, SchemaRegistry};

/// JSON Schema draft a document is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaDraft {
    /// Draft-03, evaluated natively. The default.
    Draft3,
    /// Draft-04.
    Draft4,
    /// Draft-06.
    Draft6,
    /// Draft-07.
    Draft7,
    /// Draft 2019-09.
    Draft201909,
    /// Draft 2020-12.
    Draft202012,
}

impl SchemaDraft {
    /// Pick the draft from a schema's `$schema` URI.
    ///
    /// Missing, unrecognised, or draft-03 URIs all select [`SchemaDraft::Draft3`].
    pub fn detect(schema: &Value) -> Self {
        let Some(uri) = schema.get("$schema").and_then(Value::as_str) else {
            return Self::Draft3;
        };
        if uri.contains("draft-04") {
            Self::Draft4
        } else if uri.contains("draft-06") {
            Self::Draft6
        } else if uri.contains("draft-07") {
            Self::Draft7
        } else if uri.contains("2019-09") {
            Self::Draft201909
        } else if uri.contains("2020-12") {
            Self::Draft202012
        } else {
            Self::Draft3
        }
    }

    /// The `jsonschema` draft for later drafts; `None` for draft-03.
    fn to_jsonschema(self) -> Option<jsonschema::Draft> {
        match self {
            Self::Draft3 => None,
            Self::Draft4 => Some(jsonschema::Draft::Draft4),
            Self::Draft6 => Some(jsonschema::Draft::Draft6),
            Self::Draft7 => Some(jsonschema::Draft::Draft7),
            Self::Draft201909 => Some(jsonschema::Draft::Draft201909),
            Self::Draft202012 => Some(jsonschema::Draft::Draft202012),
        }
    }
}

impl fmt::Display for SchemaDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft3 => "draft-03",
            Self::Draft4 => "draft-04",
            Self::Draft6 => "draft-06",
            Self::Draft7 => "draft-07",
            Self::Draft201909 => "2019-09",
            Self::Draft202012 => "2020-12",
        };
        f.write_str(s)
    }
}

/// Which constraint a violation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationKind {
    /// `type`
    Type,
    /// `disallow`
    Disallow,
    /// `required`
    Required,
    /// `additionalProperties`
    AdditionalProperties,
    /// `additionalItems`
    AdditionalItems,
    /// `minimum`
    Minimum,
    /// `minimum` with `exclusiveMinimum` and an equal value.
    ExclusiveMinimum,
    /// `maximum`
    Maximum,
    /// `maximum` with `exclusiveMaximum` and an equal value.
    ExclusiveMaximum,
    /// `divisibleBy`
    DivisibleBy,
    /// `minItems`
    MinItems,
    /// `maxItems`
    MaxItems,
    /// `uniqueItems`
    UniqueItems,
    /// `pattern`
    Pattern,
    /// `minLength`
    MinLength,
    /// `maxLength`
    MaxLength,
    /// `enum`
    Enum,
    /// `dependencies`
    Dependencies,
    /// A `$ref` that does not resolve inside the schema.
    UnresolvedRef,
    /// Any other constraint reported by a later-draft schema.
    Other,
}

impl ViolationKind {
    /// Standard message for this constraint.
    ///
    /// [`ViolationKind::Other`] has no standard message; the evaluator's own
    /// text is used instead.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Type => "Instance is not a required type",
            Self::Disallow => "Instance is a disallowed type",
            Self::Required => "Property is required",
            Self::AdditionalProperties => "Additional properties are not allowed",
            Self::AdditionalItems => "Additional items are not allowed",
            Self::Minimum => "Number is less than the required minimum value",
            Self::ExclusiveMinimum => "Number is equal to the required minimum value",
            Self::Maximum => "Number is greater than the required maximum value",
            Self::ExclusiveMaximum => "Number is equal to the required maximum value",
            Self::DivisibleBy => "Number is not divisible by the required number",
            Self::MinItems => "The number of items is less than the required minimum",
            Self::MaxItems => "The number of items is greater than the required maximum",
            Self::UniqueItems => "Array can only contain unique items",
            Self::Pattern => "String does not match pattern",
            Self::MinLength => "String is less than the required minimum length",
            Self::MaxLength => "String is greater than the required maximum length",
            Self::Enum => "Instance is not one of the possible values",
            Self::Dependencies => "Property is required by another property",
            Self::UnresolvedRef => "Unable to resolve schema reference",
            Self::Other => "Instance does not match the schema",
        }
    }
}

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// JSON Pointer to the violating node in the instance (`""` is the root).
    pub pointer: String,
    /// Which constraint failed.
    pub kind: ViolationKind,
    /// Human-readable description of the failure.
    pub message: String,
    /// Constraint-specific data; the allowed values for enum failures.
    pub details: Option<Value>,
}

impl Violation {
    /// A violation carrying the standard message for `kind`.
    pub fn new(pointer: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            pointer: pointer.into(),
            kind,
            message: kind.message().to_string(),
            details: None,
        }
    }

    /// Attach constraint-specific details.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.pointer, self.message)
        }
    }
}

/// Ordered violations for one instance/schema pair. Empty means pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Wrap violations in evaluation order.
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Iterate over violations in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A schema that cannot be evaluated.
#[derive(Error, Debug)]
pub enum ValidatorError {
    /// A `pattern` or `patternProperties` key is not a valid regular expression.
    #[error("invalid pattern '{pattern}' in schema: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Regex compiler message.
        reason: String,
    },

    /// `$ref` chains loop without consuming any of the instance.
    #[error("schema reference recursion exceeded {limit} levels at {pointer}")]
    RecursionLimit {
        /// Instance location where evaluation gave up.
        pointer: String,
        /// The depth limit.
        limit: usize,
    },

    /// A later-draft schema could not be compiled by `jsonschema`.
    #[error("cannot compile {draft} schema: {reason}")]
    Compile {
        /// Draft the schema declared.
        draft: SchemaDraft,
        /// Compiler message.
        reason: String,
    },
}

/// Resolves cross-schema `$ref`s of later-draft schemas from the registry.
///
/// Never touches the network: unknown URIs are an error, which surfaces as
/// [`ValidatorError::Compile`].
struct RegistryRetriever {
    schemas_by_uri: Arc<HashMap<String, Value>>,
}

impl Retrieve for RegistryRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        // Fall back to the last path segment, so `.../routes.json` finds a
        // schema registered from `routes.json`.
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        self.schemas_by_uri
            .get(filename)
            .cloned()
            .ok_or_else(|| format!("schema not registered for URI: {uri_str}").into())
    }
}

/// Validates instances against the documents of one registry.
///
/// Later-draft schemas are compiled on first use and kept for the rest of
/// the run.
pub struct SchemaValidator {
    schemas_by_uri: Arc<HashMap<String, Value>>,
    compiled: RefCell<HashMap<SchemaName, jsonschema::Validator>>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("uris", &self.schemas_by_uri.len())
            .field("compiled", &self.compiled.borrow().len())
            .finish()
    }
}

impl SchemaValidator {
    /// Prepare a validator for the documents in `registry`.
    ///
    /// Later-draft documents are indexed by their `$id` and by file name so
    /// they can reference each other.
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut schemas_by_uri = HashMap::new();
        for doc in registry.documents() {
            if doc.draft() == SchemaDraft::Draft3 {
                continue;
            }
            if let Some(id) = doc.value().get("$id").and_then(Value::as_str) {
                schemas_by_uri.insert(id.to_string(), doc.value().clone());
            }
            if let Some(file) = doc.path().file_name().and_then(|f| f.to_str()) {
                schemas_by_uri.insert(file.to_string(), doc.value().clone());
            }
        }
        Self {
            schemas_by_uri: Arc::new(schemas_by_uri),
            compiled: RefCell::new(HashMap::new()),
        }
    }

    /// Validate `instance` against `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError`] only when the schema itself cannot be
    /// evaluated.
    pub fn validate(
        &self,
        instance: &Value,
        schema: &SchemaDocument,
    ) -> Result<ValidationReport, ValidatorError> {
        let Some(draft) = schema.draft().to_jsonschema() else {
            return crate::draft3::validate(instance, schema.value());
        };
        let mut compiled = self.compiled.borrow_mut();
        let validator = match compiled.entry(schema.name().clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::trace!(schema = %schema.name(), draft = %schema.draft(), "compiling schema");
                entry.insert(self.compile(schema.value(), schema.draft(), draft)?)
            }
        };
        Ok(later_draft_report(validator, instance))
    }

    fn compile(
        &self,
        schema: &Value,
        declared: SchemaDraft,
        draft: jsonschema::Draft,
    ) -> Result<jsonschema::Validator, ValidatorError> {
        let mut opts = jsonschema::options();
        opts.with_draft(draft);
        opts.with_retriever(RegistryRetriever {
            schemas_by_uri: Arc::clone(&self.schemas_by_uri),
        });
        opts.build(schema).map_err(|e| ValidatorError::Compile {
            draft: declared,
            reason: e.to_string(),
        })
    }
}

fn later_draft_report(validator: &jsonschema::Validator, instance: &Value) -> ValidationReport {
    let violations = validator
        .iter_errors(instance)
        .map(|e| {
            let pointer = e.instance_path.to_string();
            match &e.kind {
                ValidationErrorKind::Enum { options } => {
                    Violation::new(pointer, ViolationKind::Enum).with_details(options.clone())
                }
                ValidationErrorKind::Required { property } => {
                    // Point at the missing member, as draft-03 does.
                    let name = property.as_str().map(str::to_string).unwrap_or_else(|| property.to_string());
                    Violation::new(
                        format!("{pointer}/{}", crate::draft3::escape_segment(&name)),
                        ViolationKind::Required,
                    )
                }
                ValidationErrorKind::Type { .. } => Violation::new(pointer, ViolationKind::Type),
                _ => Violation {
                    pointer,
                    kind: ViolationKind::Other,
                    message: e.to_string(),
                    details: None,
                },
            }
        })
        .collect();

    ValidationReport::new(violations)
}

/// Validate against a bare schema value, detecting its draft.
///
/// Later-draft schemas validated this way cannot reference other schemas.
///
/// # Errors
///
/// Returns [`ValidatorError`] only when the schema cannot be evaluated.
pub fn validate_value(instance: &Value, schema: &Value) -> Result<ValidationReport, ValidatorError> {
    let draft = SchemaDraft::detect(schema);
    match draft.to_jsonschema() {
        None => crate::draft3::validate(instance, schema),
        Some(js) => {
            let validator = SchemaValidator {
                schemas_by_uri: Arc::new(HashMap::new()),
                compiled: RefCell::new(HashMap::new()),
            }
            .compile(schema, draft, js)?;
            Ok(later_draft_report(&validator, instance))
        }
    }
}
