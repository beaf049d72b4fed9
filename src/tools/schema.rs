//! Argument validation against a tool's declared input schema.
//!
//! Runs before any gateway call and produces messages an agent can act on:
//! each violation names the parameter, and the rendered error lists the
//! tool's valid parameters.
//!
//! Checks, in order:
//!
//! 1. required parameters are present and non-null
//! 2. no parameter outside `properties`
//! 3. exact JSON type; the only conversion is an integral float (`10.0`) for an integer
//! 4. `enum` membership
//! 5. `minimum`/`maximum`, `minLength`/`maxLength`, `minItems`/`maxItems`
//! 6. array `items` and nested `object` properties, recursively
//!
//! Declared `default` values are filled in for absent optional parameters so
//! handlers always see a complete parameter set.

use std::fmt::Write as _;

use serde_json::{Map, Value};

/// One rejected parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Dotted parameter path (`filters[0].field`); empty for the argument object itself
    pub param: String,
    /// What is wrong with it
    pub message: String,
}

impl Violation {
    fn new(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            message: message.into(),
        }
    }
}

/// Outcome of validating one argument object
#[derive(Debug, Clone)]
pub struct Validated {
    /// Every violation found; empty when the arguments are acceptable
    pub violations: Vec<Violation>,
    /// Coerced arguments with defaults applied (meaningful only when valid)
    pub value: Value,
}

impl Validated {
    /// True when nothing was rejected
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Render violations plus the tool's parameter list
    #[must_use]
    pub fn format_error(&self, schema: &Value) -> String {
        let mut out = String::from("Tool call validation failed:\n\n");

        for v in &self.violations {
            if v.param.is_empty() {
                let _ = writeln!(out, "- {}", v.message);
            } else {
                let _ = writeln!(out, "- Parameter '{}': {}", v.param, v.message);
            }
        }

        let params = describe_params(schema);
        if !params.is_empty() {
            out.push_str("\nValid parameters for this tool:\n");
            for (name, info) in &params {
                let _ = writeln!(out, "  - {name}: {info}");
            }
        }

        out
    }
}

/// Validate `arguments` against an object schema.
///
/// `null` arguments are treated as an empty object.
#[must_use]
pub fn validate(arguments: &Value, schema: &Value) -> Validated {
    let map = match arguments {
        Value::Object(m) => m.clone(),
        Value::Null => Map::new(),
        other => {
            return Validated {
                violations: vec![Violation::new(
                    "",
                    format!("arguments must be a JSON object, got {}", type_name(other)),
                )],
                value: other.clone(),
            };
        }
    };

    let mut violations = Vec::new();
    let value = validate_object("", &map, schema, &mut violations);
    Validated { violations, value }
}

fn validate_object(
    prefix: &str,
    map: &Map<String, Value>,
    schema: &Value,
    violations: &mut Vec<Violation>,
) -> Value {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Value::Object(map.clone());
    };

    let before = violations.len();

    for name in required_names(schema) {
        match map.get(name) {
            None => violations.push(Violation::new(
                join_path(prefix, name),
                "required parameter is missing",
            )),
            Some(Value::Null) => violations.push(Violation::new(
                join_path(prefix, name),
                "required parameter must not be null",
            )),
            Some(_) => {}
        }
    }

    for key in map.keys() {
        if !properties.contains_key(key) {
            let known: Vec<&str> = properties.keys().map(String::as_str).collect();
            violations.push(Violation::new(
                join_path(prefix, key),
                format!("unknown parameter; valid parameters are: {}", known.join(", ")),
            ));
        }
    }

    // Structural problems first, so type noise does not bury them.
    if violations.len() > before {
        return Value::Object(map.clone());
    }

    let mut out = Map::new();
    for (name, prop) in properties {
        match map.get(name) {
            Some(Value::Null) | None => {
                if let Some(default) = prop.get("default") {
                    out.insert(name.clone(), default.clone());
                }
            }
            Some(raw) => {
                let path = join_path(prefix, name);
                out.insert(name.clone(), validate_value(&path, raw, prop, violations));
            }
        }
    }
    Value::Object(out)
}

fn validate_value(path: &str, raw: &Value, schema: &Value, violations: &mut Vec<Violation>) -> Value {
    let value = match schema.get("type").and_then(Value::as_str) {
        Some(ty) => match check_type(raw, ty) {
            Ok(v) => v,
            Err(msg) => {
                violations.push(Violation::new(path, msg));
                return raw.clone();
            }
        },
        None => raw.clone(),
    };

    if let Some(options) = schema.get("enum").and_then(Value::as_array) {
        if !options.contains(&value) {
            let shown: Vec<String> = options.iter().map(display_value).collect();
            violations.push(Violation::new(path, format!("must be one of: {}", shown.join(", "))));
            return value;
        }
    }

    match &value {
        Value::Number(n) => {
            if let Some(num) = n.as_f64() {
                if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
                    if num < min {
                        violations.push(Violation::new(path, format!("must be >= {min}")));
                    }
                }
                if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
                    if num > max {
                        violations.push(Violation::new(path, format!("must be <= {max}")));
                    }
                }
            }
            value
        }
        Value::String(s) => {
            let len = s.chars().count() as u64;
            if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
                if len < min {
                    violations.push(Violation::new(
                        path,
                        format!("must be at least {min} characters long"),
                    ));
                }
            }
            if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
                if len > max {
                    violations.push(Violation::new(
                        path,
                        format!("must be at most {max} characters long"),
                    ));
                }
            }
            value
        }
        Value::Array(items) => {
            let len = items.len() as u64;
            if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
                if len < min {
                    violations.push(Violation::new(path, format!("must contain at least {min} item(s)")));
                }
            }
            if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
                if len > max {
                    violations.push(Violation::new(path, format!("must contain at most {max} items")));
                }
            }
            match schema.get("items") {
                Some(item_schema) => Value::Array(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            validate_value(&format!("{path}[{i}]"), item, item_schema, violations)
                        })
                        .collect(),
                ),
                None => value,
            }
        }
        Value::Object(map) if schema.get("properties").is_some() => {
            validate_object(path, map, schema, violations)
        }
        _ => value,
    }
}

fn check_type(value: &Value, declared: &str) -> Result<Value, String> {
    match (declared, value) {
        ("string", Value::String(_))
        | ("number", Value::Number(_))
        | ("boolean", Value::Bool(_))
        | ("array", Value::Array(_))
        | ("object", Value::Object(_)) => Ok(value.clone()),
        ("integer", Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                return Ok(value.clone());
            }
            match n.as_f64() {
                #[allow(clippy::cast_possible_truncation)]
                Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
                    Ok(Value::Number((f as i64).into()))
                }
                _ => Err(format!("expected integer, got float {n}")),
            }
        }
        ("string" | "integer" | "number" | "boolean" | "array" | "object", other) => {
            Err(format!("expected {declared}, got {}", type_name(other)))
        }
        _ => Ok(value.clone()),
    }
}

fn required_names(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => format!("\"{s}\""),
        _ => v.to_string(),
    }
}

/// Parameter name with a `(type [required]) one of: ... | description` hint
fn describe_params(schema: &Value) -> Vec<(String, String)> {
    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let required = required_names(schema);

    props
        .iter()
        .map(|(name, prop)| {
            let ty = prop.get("type").and_then(Value::as_str).unwrap_or("any");
            let req = if required.contains(&name.as_str()) {
                "required"
            } else {
                "optional"
            };
            let mut info = format!("({ty} [{req}])");
            if let Some(options) = prop.get("enum").and_then(Value::as_array) {
                let shown: Vec<String> = options.iter().map(display_value).collect();
                let _ = write!(info, " one of: {}", shown.join(", "));
            }
            if let Some(desc) = prop.get("description").and_then(Value::as_str) {
                let _ = write!(info, " | {desc}");
            }
            (name.clone(), info)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn search_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "caseId": { "type": "string", "description": "The case ID" },
                "size": { "type": "integer", "minimum": 1, "maximum": 50, "default": 10 },
                "sort": { "type": "string", "enum": ["relevance", "date_asc", "date_desc"], "default": "relevance" },
                "itemIds": { "type": "array", "items": { "type": "string" }, "minItems": 1, "maxItems": 3 },
                "compliance": {
                    "type": "object",
                    "properties": { "gdprRelevant": { "type": "boolean" } }
                }
            },
            "required": ["caseId"]
        })
    }

    #[test]
    fn defaults_are_filled_in() {
        let result = validate(&json!({ "caseId": "c1" }), &search_schema());
        assert!(result.is_valid());
        assert_eq!(result.value["size"], 10);
        assert_eq!(result.value["sort"], "relevance");
        assert!(result.value.get("itemIds").is_none());
    }

    #[test]
    fn null_arguments_report_missing_required() {
        let result = validate(&Value::Null, &search_schema());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].param, "caseId");
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let result = validate(&json!([1, 2]), &search_schema());
        assert!(!result.is_valid());
        assert!(result.violations[0].message.contains("got array"));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let result = validate(&json!({ "caseId": "c1", "pageSize": 5 }), &search_schema());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].param, "pageSize");
        assert!(result.violations[0].message.contains("caseId"));
    }

    #[test]
    fn out_of_range_size_is_rejected() {
        let result = validate(&json!({ "caseId": "c1", "size": 51 }), &search_schema());
        assert_eq!(result.violations[0].message, "must be <= 50");
        let result = validate(&json!({ "caseId": "c1", "size": 0 }), &search_schema());
        assert_eq!(result.violations[0].message, "must be >= 1");
    }

    #[test]
    fn numeric_strings_are_not_integers() {
        let result = validate(&json!({ "caseId": "c1", "size": "25" }), &search_schema());
        assert!(!result.is_valid());
        assert_eq!(result.violations[0].param, "size");
        assert_eq!(result.violations[0].message, "expected integer, got string");
    }

    #[test]
    fn numbers_are_not_strings() {
        let result = validate(&json!({ "caseId": 42 }), &search_schema());
        assert!(!result.is_valid());
        assert_eq!(result.violations[0].param, "caseId");
        assert_eq!(result.violations[0].message, "expected string, got number");
    }

    #[test]
    fn integral_float_is_accepted_as_integer() {
        let result = validate(&json!({ "caseId": "c1", "size": 10.0 }), &search_schema());
        assert!(result.is_valid());
        assert_eq!(result.value["size"], 10);

        let result = validate(&json!({ "caseId": "c1", "size": 10.5 }), &search_schema());
        assert!(result.violations[0].message.contains("expected integer, got float"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let result = validate(&json!({ "caseId": "c1", "size": "lots" }), &search_schema());
        assert!(!result.is_valid());
        assert!(result.violations[0].message.contains("expected integer"));
    }

    #[test]
    fn enum_membership_is_checked() {
        let result = validate(&json!({ "caseId": "c1", "sort": "newest" }), &search_schema());
        assert!(result.violations[0].message.starts_with("must be one of"));
    }

    #[test]
    fn array_bounds_and_item_types_are_checked() {
        let schema = search_schema();
        let empty = validate(&json!({ "caseId": "c1", "itemIds": [] }), &schema);
        assert!(empty.violations[0].message.contains("at least 1"));

        let too_many = validate(&json!({ "caseId": "c1", "itemIds": ["a", "b", "c", "d"] }), &schema);
        assert!(too_many.violations[0].message.contains("at most 3"));

        let bad_item = validate(&json!({ "caseId": "c1", "itemIds": ["a", {}] }), &schema);
        assert_eq!(bad_item.violations[0].param, "itemIds[1]");
    }

    #[test]
    fn nested_objects_are_validated() {
        let schema = search_schema();
        let ok = validate(&json!({ "caseId": "c1", "compliance": { "gdprRelevant": true } }), &schema);
        assert!(ok.is_valid());
        assert_eq!(ok.value["compliance"]["gdprRelevant"], true);

        for loose in [json!("true"), json!("yes"), json!(1)] {
            let wrong = validate(&json!({ "caseId": "c1", "compliance": { "gdprRelevant": loose } }), &schema);
            assert_eq!(wrong.violations.len(), 1, "{loose}");
            assert_eq!(wrong.violations[0].param, "compliance.gdprRelevant");
        }

        let bad = validate(&json!({ "caseId": "c1", "compliance": { "hipaa": true } }), &schema);
        assert_eq!(bad.violations[0].param, "compliance.hipaa");
    }

    #[test]
    fn format_error_lists_valid_parameters() {
        let schema = search_schema();
        let result = validate(&json!({}), &schema);
        let text = result.format_error(&schema);
        assert!(text.starts_with("Tool call validation failed:"));
        assert!(text.contains("- Parameter 'caseId': required parameter is missing"));
        assert!(text.contains("caseId: (string [required]) | The case ID"));
        assert!(text.contains("sort: (string [optional]) one of: \"relevance\""));
    }
}
