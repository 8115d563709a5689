//! Metadata filtering for vector search
//!
//! Filters are a list of conditions on top-level payload fields, combined
//! with AND semantics. Supported operators:
//!
//! - `Eq`: scalar equality
//! - `Gte` / `Lte`: numeric range bounds
//! - `Any`: set membership (matches if the field, or any element of an
//!   array field, is in the set)
//!
//! The basic storage backend accepts equality only; the enhanced backend
//! accepts all operators.

use serde_json::Value as JsonValue;

use crate::error::{VectorError, VectorResult};
use crate::types::Payload;

/// Comparison applied to one payload field
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Field equals the scalar
    Eq(JsonScalar),
    /// Numeric field is `>=` the bound
    Gte(f64),
    /// Numeric field is `<=` the bound
    Lte(f64),
    /// Field (or an element of an array field) is one of the values
    Any(Vec<JsonScalar>),
}

impl FilterOp {
    /// Operator name as used in JSON filter documents
    pub fn name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "eq",
            FilterOp::Gte(_) => "gte",
            FilterOp::Lte(_) => "lte",
            FilterOp::Any(_) => "any",
        }
    }

    fn matches(&self, actual: &JsonValue) -> bool {
        match self {
            FilterOp::Eq(expected) => expected.matches_json(actual),
            FilterOp::Gte(bound) => actual.as_f64().is_some_and(|n| n >= *bound),
            FilterOp::Lte(bound) => actual.as_f64().is_some_and(|n| n <= *bound),
            FilterOp::Any(set) => match actual {
                JsonValue::Array(items) => items
                    .iter()
                    .any(|item| set.iter().any(|s| s.matches_json(item))),
                other => set.iter().any(|s| s.matches_json(other)),
            },
        }
    }
}

/// A single field condition
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Top-level payload field
    pub field: String,
    /// Operator and operand
    pub op: FilterOp,
}

/// Metadata filter for search and list
///
/// All conditions must match (AND semantics). An empty filter matches
/// every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: Vec<FilterCondition>,
}

impl MetadataFilter {
    /// Create an empty filter (matches all)
    pub fn new() -> Self {
        MetadataFilter {
            conditions: Vec::new(),
        }
    }

    fn push(mut self, field: impl Into<String>, op: FilterOp) -> Self {
        self.conditions.push(FilterCondition {
            field: field.into(),
            op,
        });
        self
    }

    /// Add an equality condition
    pub fn eq(self, field: impl Into<String>, value: impl Into<JsonScalar>) -> Self {
        self.push(field, FilterOp::Eq(value.into()))
    }

    /// Add a lower numeric bound (inclusive)
    pub fn gte(self, field: impl Into<String>, bound: f64) -> Self {
        self.push(field, FilterOp::Gte(bound))
    }

    /// Add an upper numeric bound (inclusive)
    pub fn lte(self, field: impl Into<String>, bound: f64) -> Self {
        self.push(field, FilterOp::Lte(bound))
    }

    /// Add a set-membership condition
    pub fn any<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonScalar>,
    {
        self.push(
            field,
            FilterOp::Any(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Parse a JSON filter document
    ///
    /// Each key is a payload field. A scalar value means equality; an
    /// object may carry `eq`, `gte`, `lte` and `any` operators, which are
    /// AND-combined:
    ///
    /// ```text
    /// { "kind": "fact", "importance": { "gte": 0.5, "lte": 1.0 }, "tags": { "any": ["rust", "db"] } }
    /// ```
    pub fn from_json(doc: &JsonValue) -> VectorResult<Self> {
        let obj = doc
            .as_object()
            .ok_or_else(|| VectorError::InvalidFilter("filter must be a JSON object".into()))?;

        let mut filter = MetadataFilter::new();
        for (field, spec) in obj {
            match spec {
                JsonValue::Object(ops) => {
                    if ops.is_empty() {
                        return Err(VectorError::InvalidFilter(format!(
                            "field '{}' has an empty operator object",
                            field
                        )));
                    }
                    for (op, operand) in ops {
                        filter = filter.push(field.clone(), parse_op(field, op, operand)?);
                    }
                }
                JsonValue::Array(_) => {
                    return Err(VectorError::InvalidFilter(format!(
                        "field '{}': use {{\"any\": [...]}} for set membership",
                        field
                    )))
                }
                scalar => {
                    let value = JsonScalar::from_json(scalar).ok_or_else(|| {
                        VectorError::InvalidFilter(format!("field '{}' is not a scalar", field))
                    })?;
                    filter = filter.push(field.clone(), FilterOp::Eq(value));
                }
            }
        }
        Ok(filter)
    }

    /// Check if a payload matches this filter
    pub fn matches(&self, payload: &Payload) -> bool {
        self.conditions.iter().all(|cond| {
            payload
                .get(&cond.field)
                .is_some_and(|actual| cond.op.matches(actual))
        })
    }

    /// Conditions in insertion order
    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    /// True if every condition is a plain equality
    pub fn is_equality_only(&self) -> bool {
        self.conditions
            .iter()
            .all(|c| matches!(c.op, FilterOp::Eq(_)))
    }

    /// Check if filter is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Get the number of conditions in the filter
    pub fn len(&self) -> usize {
        self.conditions.len()
    }
}

fn parse_op(field: &str, op: &str, operand: &JsonValue) -> VectorResult<FilterOp> {
    let bound = |v: &JsonValue| {
        v.as_f64().ok_or_else(|| {
            VectorError::InvalidFilter(format!("field '{}': '{}' needs a number", field, op))
        })
    };
    match op {
        "eq" => JsonScalar::from_json(operand)
            .map(FilterOp::Eq)
            .ok_or_else(|| {
                VectorError::InvalidFilter(format!("field '{}': 'eq' needs a scalar", field))
            }),
        "gte" => Ok(FilterOp::Gte(bound(operand)?)),
        "lte" => Ok(FilterOp::Lte(bound(operand)?)),
        "any" => {
            let items = operand.as_array().ok_or_else(|| {
                VectorError::InvalidFilter(format!("field '{}': 'any' needs an array", field))
            })?;
            let set = items
                .iter()
                .map(|v| {
                    JsonScalar::from_json(v).ok_or_else(|| {
                        VectorError::InvalidFilter(format!(
                            "field '{}': 'any' accepts scalars only",
                            field
                        ))
                    })
                })
                .collect::<VectorResult<Vec<_>>>()?;
            Ok(FilterOp::Any(set))
        }
        other => Err(VectorError::InvalidFilter(format!(
            "field '{}': unknown operator '{}'",
            field, other
        ))),
    }
}

/// JSON scalar value for filtering
///
/// Only scalar values can be used as operands.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonScalar {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (stored as f64)
    Number(f64),
    /// String value
    String(String),
}

impl JsonScalar {
    /// Convert a JSON scalar; arrays and objects return `None`
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => Some(JsonScalar::Null),
            JsonValue::Bool(b) => Some(JsonScalar::Bool(*b)),
            JsonValue::Number(n) => n.as_f64().map(JsonScalar::Number),
            JsonValue::String(s) => Some(JsonScalar::String(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    /// Check if this scalar matches a JSON value
    pub fn matches_json(&self, value: &JsonValue) -> bool {
        match (self, value) {
            (JsonScalar::Null, JsonValue::Null) => true,
            (JsonScalar::Bool(a), JsonValue::Bool(b)) => a == b,
            (JsonScalar::Number(a), JsonValue::Number(b)) => {
                b.as_f64().is_some_and(|n| (a - n).abs() < f64::EPSILON)
            }
            (JsonScalar::String(a), JsonValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for JsonScalar {
    fn from(b: bool) -> Self {
        JsonScalar::Bool(b)
    }
}

impl From<i32> for JsonScalar {
    fn from(n: i32) -> Self {
        JsonScalar::Number(n as f64)
    }
}

impl From<i64> for JsonScalar {
    fn from(n: i64) -> Self {
        JsonScalar::Number(n as f64)
    }
}

impl From<f64> for JsonScalar {
    fn from(n: f64) -> Self {
        JsonScalar::Number(n)
    }
}

impl From<f32> for JsonScalar {
    fn from(n: f32) -> Self {
        JsonScalar::Number(n as f64)
    }
}

impl From<String> for JsonScalar {
    fn from(s: String) -> Self {
        JsonScalar::String(s)
    }
}

impl From<&str> for JsonScalar {
    fn from(s: &str) -> Self {
        JsonScalar::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: JsonValue) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = MetadataFilter::new();
        assert!(filter.matches(&Payload::new()));
        assert!(filter.matches(&payload(json!({"foo": "bar"}))));
        assert!(filter.is_empty());
        assert_eq!(filter.len(), 0);
    }

    #[test]
    fn test_filter_matches_exact() {
        let filter = MetadataFilter::new()
            .eq("category", "document")
            .eq("year", 2024);

        let meta = payload(json!({
            "category": "document",
            "year": 2024,
            "extra": "ignored"
        }));
        assert!(filter.matches(&meta));
        assert!(filter.is_equality_only());
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_filter_missing_field() {
        let filter = MetadataFilter::new()
            .eq("category", "document")
            .eq("year", 2024);
        assert!(!filter.matches(&payload(json!({ "category": "document" }))));
    }

    #[test]
    fn test_filter_null_value() {
        let filter = MetadataFilter::new().eq("deleted", JsonScalar::Null);
        assert!(filter.matches(&payload(json!({ "deleted": null }))));
        assert!(!filter.matches(&payload(json!({ "deleted": false }))));
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let filter = MetadataFilter::new().gte("importance", 0.5).lte("importance", 0.8);
        assert!(!filter.is_equality_only());

        assert!(filter.matches(&payload(json!({ "importance": 0.5 }))));
        assert!(filter.matches(&payload(json!({ "importance": 0.8 }))));
        assert!(filter.matches(&payload(json!({ "importance": 0.7 }))));
        assert!(!filter.matches(&payload(json!({ "importance": 0.9 }))));
        assert!(!filter.matches(&payload(json!({ "importance": 0.1 }))));
    }

    #[test]
    fn test_range_ignores_non_numeric() {
        let filter = MetadataFilter::new().gte("importance", 0.5);
        assert!(!filter.matches(&payload(json!({ "importance": "high" }))));
        assert!(!filter.matches(&payload(json!({ "importance": null }))));
    }

    #[test]
    fn test_any_scalar_field() {
        let filter = MetadataFilter::new().any("kind", ["fact", "solution"]);
        assert!(filter.matches(&payload(json!({ "kind": "fact" }))));
        assert!(filter.matches(&payload(json!({ "kind": "solution" }))));
        assert!(!filter.matches(&payload(json!({ "kind": "pattern" }))));
    }

    #[test]
    fn test_any_array_field() {
        let filter = MetadataFilter::new().any("tags", ["rust"]);
        assert!(filter.matches(&payload(json!({ "tags": ["go", "rust"] }))));
        assert!(!filter.matches(&payload(json!({ "tags": ["go", "zig"] }))));
        assert!(!filter.matches(&payload(json!({ "tags": [] }))));
    }

    #[test]
    fn test_eq_does_not_match_arrays() {
        let filter = MetadataFilter::new().eq("tags", "rust");
        assert!(!filter.matches(&payload(json!({ "tags": ["rust"] }))));
    }

    #[test]
    fn test_json_scalar_matches_json() {
        assert!(JsonScalar::Null.matches_json(&JsonValue::Null));
        assert!(JsonScalar::Bool(true).matches_json(&json!(true)));
        assert!(JsonScalar::Number(42.0).matches_json(&json!(42)));
        assert!(JsonScalar::String("test".to_string()).matches_json(&json!("test")));

        assert!(!JsonScalar::Bool(true).matches_json(&json!(1)));
        assert!(!JsonScalar::Number(42.0).matches_json(&json!("42")));
        assert!(!JsonScalar::String("42".to_string()).matches_json(&json!(42)));
    }

    #[test]
    fn test_from_json_document() {
        let filter = MetadataFilter::from_json(&json!({
            "kind": "fact",
            "importance": { "gte": 0.5, "lte": 1.0 },
            "tags": { "any": ["rust", "db"] }
        }))
        .unwrap();

        assert_eq!(filter.len(), 4);
        assert!(filter.matches(&payload(json!({
            "kind": "fact",
            "importance": 0.75,
            "tags": ["db"]
        }))));
        assert!(!filter.matches(&payload(json!({
            "kind": "fact",
            "importance": 0.75,
            "tags": ["web"]
        }))));
    }

    #[test]
    fn test_from_json_rejects_bad_documents() {
        assert!(MetadataFilter::from_json(&json!("kind")).is_err());
        assert!(MetadataFilter::from_json(&json!({ "tags": ["a"] })).is_err());
        assert!(MetadataFilter::from_json(&json!({ "n": { "gt": 1 } })).is_err());
        assert!(MetadataFilter::from_json(&json!({ "n": { "gte": "one" } })).is_err());
        assert!(MetadataFilter::from_json(&json!({ "n": {} })).is_err());
        assert!(matches!(
            MetadataFilter::from_json(&json!({ "n": { "any": [[1]] } })),
            Err(VectorError::InvalidFilter(_))
        ));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn range_matches_iff_within_bounds(
                lo in -1000.0f64..1000.0,
                width in 0.0f64..500.0,
                value in -2000.0f64..2000.0,
            ) {
                let hi = lo + width;
                let filter = MetadataFilter::new().gte("n", lo).lte("n", hi);
                let matched = filter.matches(&payload(json!({ "n": value })));
                prop_assert_eq!(matched, value >= lo && value <= hi);
            }

            #[test]
            fn eq_string_matches_only_itself(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
                let filter = MetadataFilter::new().eq("k", a.as_str());
                prop_assert_eq!(filter.matches(&payload(json!({ "k": b }))), a == b);
            }
        }
    }
}
