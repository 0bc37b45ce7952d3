// src/query/operators.rs
//! Query operators
//!
//! The operator set is closed: `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$ne`
//! and `$regex`. Operator documents are parsed once into [`Operator`]
//! values so evaluation is an exhaustive `match` instead of string dispatch.
//!
//! ```text
//! { "age": { "$gte": 18, "$lt": 30 } }
//!            └─ Operator::Gte(18) ─┴─ Operator::Lt(30)
//! ```

use crate::error::{JsonBaseError, Result};
use crate::value_utils::{compare_values, stringify_value, type_name, values_equal};
use lazy_static::lazy_static;
use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::num::NonZeroUsize;
use tracing::trace;

// ============================================================================
// REGEX CACHE
// ============================================================================

const REGEX_CACHE_CAPACITY: usize = 100;

lazy_static! {
    /// Compiled patterns keyed by source text, bounded to avoid unbounded growth
    static ref REGEX_CACHE: Mutex<LruCache<String, Regex>> = Mutex::new(LruCache::new(
        NonZeroUsize::new(REGEX_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN)
    ));
}

/// Get or compile a regex pattern through the LRU cache
fn get_or_compile_regex(pattern: &str) -> Result<Regex> {
    if let Some(regex) = REGEX_CACHE.lock().get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(pattern).map_err(|e| {
        JsonBaseError::InvalidQuery(format!("Invalid regex pattern '{}': {}", pattern, e))
    })?;

    REGEX_CACHE.lock().put(pattern.to_string(), regex.clone());
    Ok(regex)
}

// ============================================================================
// OPERATOR
// ============================================================================

/// One comparison inside an operator document
#[derive(Debug, Clone)]
pub enum Operator {
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Ne(Value),
    Regex(Regex),
}

impl Operator {
    /// Parse a single `$op: operand` pair
    ///
    /// Returns `Ok(None)` for operator names outside the supported set; the
    /// caller treats those as always satisfied.
    pub fn parse(name: &str, operand: &Value) -> Result<Option<Operator>> {
        let op = match name {
            "$gt" => Operator::Gt(operand.clone()),
            "$gte" => Operator::Gte(operand.clone()),
            "$lt" => Operator::Lt(operand.clone()),
            "$lte" => Operator::Lte(operand.clone()),
            "$ne" => Operator::Ne(operand.clone()),
            "$in" => match operand {
                Value::Array(values) => Operator::In(values.clone()),
                _ => {
                    return Err(JsonBaseError::InvalidQuery(
                        "$in operator requires an array".to_string(),
                    ))
                }
            },
            "$regex" => match operand {
                Value::String(pattern) => Operator::Regex(get_or_compile_regex(pattern)?),
                _ => {
                    return Err(JsonBaseError::InvalidQuery(
                        "$regex operator requires a string pattern".to_string(),
                    ))
                }
            },
            _ => return Ok(None),
        };
        Ok(Some(op))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::Gt(_) => "$gt",
            Operator::Gte(_) => "$gte",
            Operator::Lt(_) => "$lt",
            Operator::Lte(_) => "$lte",
            Operator::In(_) => "$in",
            Operator::Ne(_) => "$ne",
            Operator::Regex(_) => "$regex",
        }
    }

    /// Evaluate against the resolved value of `field` (`None` when absent)
    ///
    /// # Errors
    ///
    /// `TypeMismatch` when an ordered operator meets a present, non-null value
    /// that has no ordering with its operand.
    pub fn matches(&self, field: &str, doc_value: Option<&Value>) -> Result<bool> {
        let matched = match self {
            Operator::Gt(operand) => {
                compare_with_predicate(field, doc_value, operand, |ord| ord == Ordering::Greater)?
            }
            Operator::Gte(operand) => compare_with_predicate(field, doc_value, operand, |ord| {
                matches!(ord, Ordering::Greater | Ordering::Equal)
            })?,
            Operator::Lt(operand) => {
                compare_with_predicate(field, doc_value, operand, |ord| ord == Ordering::Less)?
            }
            Operator::Lte(operand) => compare_with_predicate(field, doc_value, operand, |ord| {
                matches!(ord, Ordering::Less | Ordering::Equal)
            })?,
            Operator::In(candidates) => match doc_value {
                None => false,
                Some(v) => candidates.iter().any(|c| values_equal(v, c)),
            },
            // Absent fields are "not equal" to anything
            Operator::Ne(operand) => match doc_value {
                None => true,
                Some(v) => !values_equal(v, operand),
            },
            Operator::Regex(regex) => match doc_value {
                None => false,
                Some(v) => regex.is_match(&stringify_value(v)),
            },
        };

        trace!(field, op = self.name(), matched, "operator evaluated");
        Ok(matched)
    }
}

/// Shared body of `$gt`, `$gte`, `$lt` and `$lte`
///
/// Absent and null values never match. Anything else must be order-comparable
/// with the operand.
fn compare_with_predicate<F>(
    field: &str,
    doc_value: Option<&Value>,
    operand: &Value,
    predicate: F,
) -> Result<bool>
where
    F: Fn(Ordering) -> bool,
{
    match doc_value {
        None | Some(Value::Null) => Ok(false),
        Some(v) => match compare_values(v, operand) {
            Some(ordering) => Ok(predicate(ordering)),
            None => Err(JsonBaseError::TypeMismatch {
                field: field.to_string(),
                found: type_name(v),
                expected: type_name(operand),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(name: &str, operand: Value) -> Operator {
        Operator::parse(name, &operand).unwrap().unwrap()
    }

    // ========== Comparison operators ==========

    #[test]
    fn test_gt_operator() {
        let gt = op("$gt", json!(5));
        assert!(gt.matches("n", Some(&json!(10))).unwrap());
        assert!(!gt.matches("n", Some(&json!(5))).unwrap());
        assert!(!gt.matches("n", Some(&json!(3))).unwrap());
        assert!(!gt.matches("n", None).unwrap()); // Missing field
    }

    #[test]
    fn test_gte_operator() {
        let gte = op("$gte", json!(5));
        assert!(gte.matches("n", Some(&json!(10))).unwrap());
        assert!(gte.matches("n", Some(&json!(5))).unwrap()); // Equal
        assert!(gte.matches("n", Some(&json!(5.0))).unwrap());
        assert!(!gte.matches("n", Some(&json!(3))).unwrap());
    }

    #[test]
    fn test_lt_operator() {
        let lt = op("$lt", json!(5));
        assert!(lt.matches("n", Some(&json!(3))).unwrap());
        assert!(lt.matches("n", Some(&json!(4.99))).unwrap());
        assert!(!lt.matches("n", Some(&json!(5))).unwrap()); // Equal
        assert!(!lt.matches("n", None).unwrap());
    }

    #[test]
    fn test_lte_operator() {
        let lte = op("$lte", json!(5));
        assert!(lte.matches("n", Some(&json!(3))).unwrap());
        assert!(lte.matches("n", Some(&json!(5))).unwrap());
        assert!(!lte.matches("n", Some(&json!(10))).unwrap());
    }

    #[test]
    fn test_comparison_strings() {
        let gt = op("$gt", json!("apple"));
        assert!(gt.matches("s", Some(&json!("banana"))).unwrap());
        assert!(!gt.matches("s", Some(&json!("aardvark"))).unwrap());
    }

    #[test]
    fn test_comparison_null_value_does_not_match() {
        let gt = op("$gt", json!(1));
        assert!(!gt.matches("n", Some(&Value::Null)).unwrap());
    }

    #[test]
    fn test_comparison_incompatible_types_is_error() {
        let gt = op("$gt", json!(5));
        let err = gt.matches("age", Some(&json!("10"))).unwrap_err();
        match err {
            JsonBaseError::TypeMismatch { field, found, expected } => {
                assert_eq!(field, "age");
                assert_eq!(found, "string");
                assert_eq!(expected, "number");
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_booleans_is_error() {
        let lt = op("$lt", json!(true));
        assert!(matches!(
            lt.matches("flag", Some(&json!(false))),
            Err(JsonBaseError::TypeMismatch { .. })
        ));
    }

    // ========== $in / $ne ==========

    #[test]
    fn test_in_operator() {
        let in_op = op("$in", json!(["NYC", "LA", 3]));
        assert!(in_op.matches("c", Some(&json!("NYC"))).unwrap());
        assert!(in_op.matches("c", Some(&json!(3.0))).unwrap());
        assert!(!in_op.matches("c", Some(&json!("Chicago"))).unwrap());
        assert!(!in_op.matches("c", None).unwrap());
    }

    #[test]
    fn test_in_not_array_error() {
        let result = Operator::parse("$in", &json!("not an array"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("requires an array"));
    }

    #[test]
    fn test_ne_operator() {
        let ne = op("$ne", json!("Alice"));
        assert!(ne.matches("name", Some(&json!("Bob"))).unwrap());
        assert!(!ne.matches("name", Some(&json!("Alice"))).unwrap());
        assert!(ne.matches("name", None).unwrap()); // Missing field returns true
        assert!(ne.matches("name", Some(&json!(1))).unwrap()); // Different type
    }

    // ========== $regex ==========

    #[test]
    fn test_regex_substring_search() {
        let re = op("$regex", json!("li"));
        assert!(re.matches("name", Some(&json!("Alice"))).unwrap());
        assert!(!re.matches("name", Some(&json!("Bob"))).unwrap());
    }

    #[test]
    fn test_regex_anchors() {
        let re = op("$regex", json!("^A.*e$"));
        assert!(re.matches("name", Some(&json!("Alice"))).unwrap());
        assert!(!re.matches("name", Some(&json!("Malice"))).unwrap());
    }

    #[test]
    fn test_regex_on_stringified_number() {
        let re = op("$regex", json!("^20"));
        assert!(re.matches("year", Some(&json!(2024))).unwrap());
        assert!(!re.matches("year", Some(&json!(1999))).unwrap());
        assert!(!re.matches("year", None).unwrap());
    }

    #[test]
    fn test_regex_invalid_pattern() {
        let err = Operator::parse("$regex", &json!("(unclosed")).unwrap_err();
        assert!(matches!(err, JsonBaseError::InvalidQuery(_)));
        assert!(Operator::parse("$regex", &json!(5)).is_err());
    }

    #[test]
    fn test_regex_cache_reuse() {
        let first = get_or_compile_regex("cache[0-9]+").unwrap();
        let second = get_or_compile_regex("cache[0-9]+").unwrap();
        assert_eq!(first.as_str(), second.as_str());
    }

    // ========== Parsing ==========

    #[test]
    fn test_unknown_operator_parses_to_none() {
        assert!(Operator::parse("$exists", &json!(true)).unwrap().is_none());
        assert!(Operator::parse("$foo", &json!(1)).unwrap().is_none());
    }

    #[test]
    fn test_operator_names() {
        for name in ["$gt", "$gte", "$lt", "$lte", "$ne"] {
            assert_eq!(op(name, json!(1)).name(), name);
        }
        assert_eq!(op("$in", json!([])).name(), "$in");
        assert_eq!(op("$regex", json!("x")).name(), "$regex");
    }
}
