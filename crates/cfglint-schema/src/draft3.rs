//! # Draft-03 Evaluator
//!
//! Native evaluation of JSON Schema draft-03, the dialect config schemas
//! are written in. Supported keywords:
//!
//! - any instance: `type`, `disallow`, `enum`, `extends`, `$ref`
//! - objects: `properties`, `patternProperties`, `additionalProperties`,
//!   `required`, `dependencies`
//! - arrays: `items`, `additionalItems`, `minItems`, `maxItems`, `uniqueItems`
//! - strings: `pattern`, `minLength`, `maxLength`
//! - numbers: `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum`,
//!   `divisibleBy`
//!
//! `required` is the draft-03 boolean on a property schema. An array of
//! member names on the object schema (the draft-04 spelling) is honoured
//! as well, since hand-written config schemas mix the two.
//!
//! Evaluation never stops at the first failure: every violated constraint
//! becomes one [`Violation`], in schema order. A missing required member is
//! reported at the member's own pointer, not the parent's.

use std::collections::{HashMap, HashSet};

use fancy_regex::Regex;
use serde_json::{Map, Number, Value};

use crate::validate::{ValidationReport, ValidatorError, Violation, ViolationKind};

/// How many schema hops (`$ref`, `extends`, type unions) may be taken
/// without descending into the instance.
const MAX_SCHEMA_HOPS: usize = 64;

/// Evaluate `instance` against the draft-03 `schema`.
///
/// # Errors
///
/// Returns [`ValidatorError::InvalidPattern`] for a malformed pattern, and [`ValidatorError::RecursionLimit`] for `$ref` cycles that
/// never reach the instance.
pub fn validate(instance: &Value, schema: &Value) -> Result<ValidationReport, ValidatorError> {
    let mut evaluator = Evaluator {
        root: schema,
        regexes: HashMap::new(),
        violations: Vec::new(),
    };
    evaluator.evaluate(instance, schema, "", 0)?;
    Ok(ValidationReport::new(evaluator.violations))
}

/// Escape one JSON Pointer reference token.
pub(crate) fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn child(pointer: &str, segment: &str) -> String {
    format!("{pointer}/{}", escape_segment(segment))
}

struct Evaluator<'s> {
    root: &'s Value,
    regexes: HashMap<String, Regex>,
    violations: Vec<Violation>,
}

impl<'s> Evaluator<'s> {
    fn evaluate(
        &mut self,
        instance: &Value,
        schema: &'s Value,
        pointer: &str,
        hops: usize,
    ) -> Result<(), ValidatorError> {
        if hops > MAX_SCHEMA_HOPS {
            return Err(ValidatorError::RecursionLimit {
                pointer: pointer.to_string(),
                limit: MAX_SCHEMA_HOPS,
            });
        }
        // Draft-03 has no boolean schemas; anything but an object constrains nothing.
        let Some(keywords) = schema.as_object() else {
            return Ok(());
        };

        // A reference replaces the schema it appears in.
        if let Some(reference) = keywords.get("$ref").and_then(Value::as_str) {
            return match self.resolve(reference) {
                Some(target) => self.evaluate(instance, target, pointer, hops + 1),
                None => {
                    self.violations.push(
                        Violation::new(pointer, ViolationKind::UnresolvedRef)
                            .with_details(Value::String(reference.to_string())),
                    );
                    Ok(())
                }
            };
        }

        if let Some(types) = keywords.get("type") {
            if !self.matches_type(instance, types, pointer, hops)? {
                self.violations
                    .push(Violation::new(pointer, ViolationKind::Type).with_details(types.clone()));
            }
        }

        if let Some(types) = keywords.get("disallow") {
            if self.matches_type(instance, types, pointer, hops)? {
                self.violations.push(
                    Violation::new(pointer, ViolationKind::Disallow).with_details(types.clone()),
                );
            }
        }

        if let Some(Value::Array(allowed)) = keywords.get("enum") {
            if !allowed.iter().any(|a| json_equal(a, instance)) {
                self.violations.push(
                    Violation::new(pointer, ViolationKind::Enum)
                        .with_details(Value::Array(allowed.clone())),
                );
            }
        }

        match instance {
            Value::Object(members) => self.evaluate_object(instance, members, keywords, pointer, hops)?,
            Value::Array(items) => self.evaluate_array(items, keywords, pointer)?,
            Value::String(s) => self.evaluate_string(s, keywords, pointer)?,
            Value::Number(n) => self.evaluate_number(n, keywords, pointer),
            Value::Null | Value::Bool(_) => {}
        }

        match keywords.get("extends") {
            Some(base @ Value::Object(_)) => self.evaluate(instance, base, pointer, hops + 1)?,
            Some(Value::Array(bases)) => {
                for base in bases {
                    self.evaluate(instance, base, pointer, hops + 1)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn evaluate_object(
        &mut self,
        instance: &Value,
        members: &Map<String, Value>,
        keywords: &'s Map<String, Value>,
        pointer: &str,
        hops: usize,
    ) -> Result<(), ValidatorError> {
        let properties = keywords.get("properties").and_then(Value::as_object);
        let pattern_properties = keywords.get("patternProperties").and_then(Value::as_object);
        let mut missing: HashSet<&'s str> = HashSet::new();

        if let Some(properties) = properties {
            for (name, property_schema) in properties {
                match members.get(name) {
                    Some(value) => self.evaluate(value, property_schema, &child(pointer, name), 0)?,
                    None => {
                        if property_schema.get("required").and_then(Value::as_bool) == Some(true) {
                            missing.insert(name.as_str());
                            self.violations
                                .push(Violation::new(child(pointer, name), ViolationKind::Required));
                        }
                    }
                }
            }
        }

        if let Some(Value::Array(names)) = keywords.get("required") {
            for name in names.iter().filter_map(Value::as_str) {
                if !members.contains_key(name) && missing.insert(name) {
                    self.violations
                        .push(Violation::new(child(pointer, name), ViolationKind::Required));
                }
            }
        }

        if let Some(pattern_properties) = pattern_properties {
            for (pattern, member_schema) in pattern_properties {
                for (key, value) in members {
                    if self.is_match(pattern, key)? {
                        self.evaluate(value, member_schema, &child(pointer, key), 0)?;
                    }
                }
            }
        }

        match keywords.get("additionalProperties") {
            None | Some(Value::Bool(true)) => {}
            Some(additional) => {
                for (key, value) in members {
                    if properties.is_some_and(|p| p.contains_key(key))
                        || self.matches_any_pattern(pattern_properties, key)?
                    {
                        continue;
                    }
                    match additional {
                        Value::Bool(false) => self.violations.push(Violation::new(
                            child(pointer, key),
                            ViolationKind::AdditionalProperties,
                        )),
                        Value::Object(_) => self.evaluate(value, additional, &child(pointer, key), 0)?,
                        _ => {}
                    }
                }
            }
        }

        if let Some(dependencies) = keywords.get("dependencies").and_then(Value::as_object) {
            for (property, dependency) in dependencies {
                if !members.contains_key(property) {
                    continue;
                }
                match dependency {
                    Value::String(required) => self.require_dependency(members, property, required, pointer),
                    Value::Array(list) => {
                        for required in list.iter().filter_map(Value::as_str) {
                            self.require_dependency(members, property, required, pointer);
                        }
                    }
                    Value::Object(_) => self.evaluate(instance, dependency, pointer, hops + 1)?,
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn require_dependency(
        &mut self,
        members: &Map<String, Value>,
        property: &str,
        required: &str,
        pointer: &str,
    ) {
        if !members.contains_key(required) {
            self.violations.push(
                Violation::new(child(pointer, required), ViolationKind::Dependencies)
                    .with_details(Value::String(property.to_string())),
            );
        }
    }

    fn evaluate_array(
        &mut self,
        items: &[Value],
        keywords: &'s Map<String, Value>,
        pointer: &str,
    ) -> Result<(), ValidatorError> {
        match keywords.get("items") {
            Some(item_schema @ Value::Object(_)) => {
                for (i, item) in items.iter().enumerate() {
                    self.evaluate(item, item_schema, &child(pointer, &i.to_string()), 0)?;
                }
            }
            Some(Value::Array(tuple)) => {
                for (i, item) in items.iter().enumerate() {
                    let at = child(pointer, &i.to_string());
                    match (tuple.get(i), keywords.get("additionalItems")) {
                        (Some(item_schema), _) => self.evaluate(item, item_schema, &at, 0)?,
                        (None, Some(Value::Bool(false))) => self
                            .violations
                            .push(Violation::new(at, ViolationKind::AdditionalItems)),
                        (None, Some(extra @ Value::Object(_))) => self.evaluate(item, extra, &at, 0)?,
                        (None, _) => {}
                    }
                }
            }
            _ => {}
        }

        let count = items.len() as u64;
        if let Some(min) = keywords.get("minItems").and_then(Value::as_u64) {
            if count < min {
                self.violations
                    .push(Violation::new(pointer, ViolationKind::MinItems).with_details(min.into()));
            }
        }
        if let Some(max) = keywords.get("maxItems").and_then(Value::as_u64) {
            if count > max {
                self.violations
                    .push(Violation::new(pointer, ViolationKind::MaxItems).with_details(max.into()));
            }
        }

        if keywords.get("uniqueItems").and_then(Value::as_bool) == Some(true) && has_duplicates(items) {
            self.violations
                .push(Violation::new(pointer, ViolationKind::UniqueItems));
        }

        Ok(())
    }

    fn evaluate_string(
        &mut self,
        s: &str,
        keywords: &Map<String, Value>,
        pointer: &str,
    ) -> Result<(), ValidatorError> {
        let length = s.chars().count() as u64;
        if let Some(min) = keywords.get("minLength").and_then(Value::as_u64) {
            if length < min {
                self.violations
                    .push(Violation::new(pointer, ViolationKind::MinLength).with_details(min.into()));
            }
        }
        if let Some(max) = keywords.get("maxLength").and_then(Value::as_u64) {
            if length > max {
                self.violations
                    .push(Violation::new(pointer, ViolationKind::MaxLength).with_details(max.into()));
            }
        }
        if let Some(pattern) = keywords.get("pattern").and_then(Value::as_str) {
            if !self.is_match(pattern, s)? {
                self.violations.push(
                    Violation::new(pointer, ViolationKind::Pattern)
                        .with_details(Value::String(pattern.to_string())),
                );
            }
        }
        Ok(())
    }

    fn evaluate_number(&mut self, n: &Number, keywords: &Map<String, Value>, pointer: &str) {
        let Some(x) = n.as_f64() else {
            return;
        };

        if let Some(min) = keywords.get("minimum") {
            if let Some(bound) = min.as_f64() {
                let exclusive = keywords.get("exclusiveMinimum").and_then(Value::as_bool) == Some(true);
                if x < bound {
                    self.violations
                        .push(Violation::new(pointer, ViolationKind::Minimum).with_details(min.clone()));
                } else if exclusive && x == bound {
                    self.violations.push(
                        Violation::new(pointer, ViolationKind::ExclusiveMinimum).with_details(min.clone()),
                    );
                }
            }
        }

        if let Some(max) = keywords.get("maximum") {
            if let Some(bound) = max.as_f64() {
                let exclusive = keywords.get("exclusiveMaximum").and_then(Value::as_bool) == Some(true);
                if x > bound {
                    self.violations
                        .push(Violation::new(pointer, ViolationKind::Maximum).with_details(max.clone()));
                } else if exclusive && x == bound {
                    self.violations.push(
                        Violation::new(pointer, ViolationKind::ExclusiveMaximum).with_details(max.clone()),
                    );
                }
            }
        }

        if let Some(divisor) = keywords.get("divisibleBy") {
            if !is_divisible(n, divisor) {
                self.violations.push(
                    Violation::new(pointer, ViolationKind::DivisibleBy).with_details(divisor.clone()),
                );
            }
        }
    }

    /// Whether `instance` satisfies a `type`/`disallow` value: a type name,
    /// a schema, or an array mixing both.
    fn matches_type(
        &mut self,
        instance: &Value,
        types: &'s Value,
        pointer: &str,
        hops: usize,
    ) -> Result<bool, ValidatorError> {
        match types {
            Value::String(name) => Ok(primitive_matches(instance, name)),
            Value::Array(options) => {
                for option in options {
                    let matched = match option {
                        Value::String(name) => primitive_matches(instance, name),
                        Value::Object(_) => self.is_valid(instance, option, pointer, hops + 1)?,
                        _ => false,
                    };
                    if matched {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Value::Object(_) => self.is_valid(instance, types, pointer, hops + 1),
            _ => Ok(true),
        }
    }

    /// Evaluate in isolation, reporting only whether anything failed.
    fn is_valid(
        &mut self,
        instance: &Value,
        schema: &'s Value,
        pointer: &str,
        hops: usize,
    ) -> Result<bool, ValidatorError> {
        let outer = std::mem::take(&mut self.violations);
        let result = self.evaluate(instance, schema, pointer, hops);
        let valid = self.violations.is_empty();
        self.violations = outer;
        result.map(|()| valid)
    }

    fn matches_any_pattern(
        &mut self,
        pattern_properties: Option<&'s Map<String, Value>>,
        key: &str,
    ) -> Result<bool, ValidatorError> {
        if let Some(patterns) = pattern_properties {
            for pattern in patterns.keys() {
                if self.is_match(pattern, key)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// ECMA-style search: lookaround and backreferences are supported. A
    /// match that exhausts the backtracking limit counts as no match.
    fn is_match(&mut self, pattern: &str, text: &str) -> Result<bool, ValidatorError> {
        if !self.regexes.contains_key(pattern) {
            let re = Regex::new(pattern).map_err(|e| ValidatorError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            self.regexes.insert(pattern.to_string(), re);
        }
        let Some(re) = self.regexes.get(pattern) else {
            return Ok(false);
        };
        Ok(re.is_match(text).unwrap_or_else(|e| {
            tracing::warn!(pattern, error = %e, "pattern match aborted");
            false
        }))
    }

    /// Resolve `#`-relative references, and absolute ones naming the root's `id`.
    fn resolve(&self, reference: &str) -> Option<&'s Value> {
        let root = self.root;
        let (base, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        if base.is_empty() {
            return root.pointer(fragment);
        }
        let id = root
            .get("id")
            .or_else(|| root.get("$id"))
            .and_then(Value::as_str)?;
        if base == id.trim_end_matches('#') {
            root.pointer(fragment)
        } else {
            None
        }
    }
}

fn primitive_matches(instance: &Value, name: &str) -> bool {
    match name {
        "any" => true,
        "string" => instance.is_string(),
        "number" => instance.is_number(),
        "integer" => is_integer(instance),
        "boolean" => instance.is_boolean(),
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "null" => instance.is_null(),
        _ => false,
    }
}

/// Integers include floats with no fractional part (`1.0`).
fn is_integer(instance: &Value) -> bool {
    match instance {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

fn is_divisible(n: &Number, divisor: &Value) -> bool {
    if let (Some(a), Some(b)) = (n.as_i64(), divisor.as_i64()) {
        // A zero divisor is a schema error; treat it as satisfied.
        return a.checked_rem(b).map_or(true, |r| r == 0);
    }
    let (Some(a), Some(b)) = (n.as_f64(), divisor.as_f64()) else {
        return true;
    };
    if b == 0.0 {
        return true;
    }
    let quotient = a / b;
    (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
}

/// Structural equality where numbers compare by value (`1 == 1.0`).
pub(crate) fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(i), Some(j)) = (x.as_i64(), y.as_i64()) {
                i == j
            } else if let (Some(i), Some(j)) = (x.as_u64(), y.as_u64()) {
                i == j
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| json_equal(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| json_equal(v, w)))
        }
        _ => a == b,
    }
}

fn has_duplicates(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, a)| items[i + 1..].iter().any(|b| json_equal(a, b)))
}
