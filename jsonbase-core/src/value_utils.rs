//! Value utility functions shared across modules
//!
//! Field path resolution, numeric-aware equality, ordering and the
//! canonical string form used for index keys, group keys and `$regex`.

use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Resolve a dot-separated field path against a JSON object
///
/// Walks successive mapping lookups. Returns `None` when a key is missing at
/// any level or an intermediate value is not an object. Never fails.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use jsonbase_core::value_utils::resolve_path;
///
/// let doc = json!({"address": {"city": "London"}, "tags": ["a"]});
/// assert_eq!(resolve_path(&doc, "address.city"), Some(&json!("London")));
/// assert_eq!(resolve_path(&doc, "address.zip"), None);
/// assert_eq!(resolve_path(&doc, "tags.0"), None); // sequences are not walked
/// ```
pub fn resolve_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut value = doc;
    for part in path.split('.') {
        match value {
            Value::Object(map) => value = map.get(part)?,
            _ => return None,
        }
    }
    Some(value)
}

/// Type-sensitive equality where integers and floats of equal magnitude match
///
/// `1 == 1.0`, but `1 != "1"` and `true != 1`. Objects compare key by key
/// regardless of key order; arrays compare element by element.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => numbers_equal(n1, n2),
        (Value::Array(a1), Value::Array(a2)) => {
            a1.len() == a2.len() && a1.iter().zip(a2).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(m1), Value::Object(m2)) => {
            m1.len() == m2.len()
                && m1
                    .iter()
                    .all(|(k, v)| m2.get(k).map(|w| values_equal(v, w)).unwrap_or(false))
        }
        _ => a == b,
    }
}

fn numbers_equal(n1: &Number, n2: &Number) -> bool {
    match (exact_number(n1), exact_number(n2)) {
        (ExactNumber::Integer(i1), ExactNumber::Integer(i2)) => i1 == i2,
        (ExactNumber::Float(f1), ExactNumber::Float(f2)) => f1 == f2,
        _ => false,
    }
}

// -2^63 and 2^64 as f64; integral floats in [-2^63, 2^64) fit i64 or u64
const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;
const U64_END_F64: f64 = 18_446_744_073_709_551_616.0;

/// A number normalized so integers and integral floats compare exactly
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExactNumber {
    Integer(i128),
    Float(f64),
}

fn exact_number(n: &Number) -> ExactNumber {
    if let Some(i) = n.as_i64() {
        return ExactNumber::Integer(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return ExactNumber::Integer(i128::from(u));
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && (I64_MIN_F64..U64_END_F64).contains(&f) => {
            ExactNumber::Integer(f as i128)
        }
        Some(f) => ExactNumber::Float(f),
        None => ExactNumber::Float(f64::NAN),
    }
}

/// Compare two JSON values for the ordered operators
///
/// Returns `Some(Ordering)` for number vs number (numerically) and
/// string vs string (lexicographically), `None` for every other pairing.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use std::cmp::Ordering;
/// use jsonbase_core::value_utils::compare_values;
///
/// assert_eq!(compare_values(&json!(10), &json!(5)), Some(Ordering::Greater));
/// assert_eq!(compare_values(&json!(2.5), &json!(3)), Some(Ordering::Less));
/// assert_eq!(compare_values(&json!("a"), &json!("b")), Some(Ordering::Less));
/// assert_eq!(compare_values(&json!("a"), &json!(1)), None);
/// ```
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => match (exact_number(n1), exact_number(n2)) {
            (ExactNumber::Integer(i1), ExactNumber::Integer(i2)) => Some(i1.cmp(&i2)),
            _ => n1.as_f64()?.partial_cmp(&n2.as_f64()?),
        },
        (Value::String(s1), Value::String(s2)) => Some(s1.cmp(s2)),
        _ => None,
    }
}

/// Canonical string form of a value
///
/// Strings are returned verbatim. Every other value is rendered as compact
/// JSON with object keys sorted and integral floats written as integers, so
/// values that compare equal under [`values_equal`] stringify identically.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use jsonbase_core::value_utils::stringify_value;
///
/// assert_eq!(stringify_value(&json!("London")), "London");
/// assert_eq!(stringify_value(&json!(30)), "30");
/// assert_eq!(stringify_value(&json!(30.0)), "30");
/// assert_eq!(stringify_value(&json!({"b": 2, "a": 1})), r#"{"a":1,"b":2}"#);
/// ```
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => canonical_json_string(other),
    }
}

/// Canonical compact JSON text (sorted keys, normalized numbers)
pub fn canonical_json_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => canonical_number(n),
        Value::String(s) => Value::String(s.clone()).to_string(),
        Value::Array(arr) => {
            let inner: Vec<String> = arr.iter().map(canonical_json_string).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));

            let inner: Vec<String> = pairs
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}:{}",
                        Value::String((*k).clone()),
                        canonical_json_string(v)
                    )
                })
                .collect();
            format!("{{{}}}", inner.join(","))
        }
    }
}

fn canonical_number(n: &Number) -> String {
    match exact_number(n) {
        ExactNumber::Integer(i) => i.to_string(),
        ExactNumber::Float(_) => n.to_string(),
    }
}

/// Short type label used in error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_top_level() {
        let doc = json!({"name": "Alice", "age": 30});
        assert_eq!(resolve_path(&doc, "name"), Some(&json!("Alice")));
        assert_eq!(resolve_path(&doc, "missing"), None);
    }

    #[test]
    fn test_resolve_nested() {
        let doc = json!({"a": {"b": {"c": 7}}});
        assert_eq!(resolve_path(&doc, "a.b.c"), Some(&json!(7)));
        assert_eq!(resolve_path(&doc, "a.b"), Some(&json!({"c": 7})));
        assert_eq!(resolve_path(&doc, "a.x.c"), None);
    }

    #[test]
    fn test_resolve_through_non_object() {
        let doc = json!({"a": 5, "s": "text", "list": [{"b": 1}]});
        assert_eq!(resolve_path(&doc, "a.b"), None);
        assert_eq!(resolve_path(&doc, "s.len"), None);
        assert_eq!(resolve_path(&doc, "list.b"), None);
    }

    #[test]
    fn test_resolve_explicit_null_is_present() {
        let doc = json!({"x": null});
        assert_eq!(resolve_path(&doc, "x"), Some(&Value::Null));
        assert_eq!(resolve_path(&doc, "x.y"), None);
    }

    #[test]
    fn test_resolve_empty_path() {
        assert_eq!(resolve_path(&json!({"": 1}), ""), None);
    }

    #[test]
    fn test_values_equal_numbers() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!(-3), &json!(-3)));
        assert!(!values_equal(&json!(1), &json!(1.5)));
        assert!(!values_equal(&json!(1), &json!("1")));
        assert!(!values_equal(&json!(true), &json!(1)));
    }

    #[test]
    fn test_values_equal_containers() {
        assert!(values_equal(&json!([1, 2.0]), &json!([1.0, 2])));
        assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(values_equal(
            &json!({"a": 1, "b": {"c": 2}}),
            &json!({"b": {"c": 2.0}, "a": 1})
        ));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_compare_incompatible() {
        assert_eq!(compare_values(&json!(true), &json!(false)), None);
        assert_eq!(compare_values(&json!(null), &json!(1)), None);
        assert_eq!(compare_values(&json!([1]), &json!([2])), None);
    }

    #[test]
    fn test_compare_large_integers_exact() {
        let a = json!(9_007_199_254_740_993_i64);
        let b = json!(9_007_199_254_740_992_i64);
        assert_eq!(compare_values(&a, &b), Some(Ordering::Greater));
    }

    #[test]
    fn test_large_integral_floats_match_integers_exactly() {
        // 2^53 + 1 has no f64 representation
        let beyond = json!(9_007_199_254_740_993_i64);
        let boundary = json!(9_007_199_254_740_992_i64);
        let boundary_float = json!(9_007_199_254_740_992.0);
        assert!(!values_equal(&beyond, &boundary_float));
        assert!(values_equal(&boundary, &boundary_float));
        assert!(values_equal(&json!(10_000_000_000_000_000_000_u64), &json!(1e19)));
        assert!(!values_equal(&json!(u64::MAX), &json!(1.8446744073709552e19)));

        assert_eq!(stringify_value(&json!(9_007_199_254_740_992.0)), "9007199254740992");
        assert_eq!(stringify_value(&json!(1e19)), "10000000000000000000");
        assert_eq!(stringify_value(&json!(-9.223372036854775808e18)), "-9223372036854775808");
        // Beyond u64 the float text is kept
        assert_eq!(stringify_value(&json!(1e20)), json!(1e20).to_string());
    }

    #[test]
    fn test_equal_numbers_stringify_identically() {
        let pairs = [
            (json!(9_007_199_254_740_993_i64), json!(9_007_199_254_740_992.0)),
            (json!(9_007_199_254_740_992_i64), json!(9_007_199_254_740_992.0)),
            (json!(10_000_000_000_000_000_000_u64), json!(1e19)),
            (json!(i64::MIN), json!(-9.223372036854775808e18)),
            (json!(u64::MAX), json!(1.8446744073709552e19)),
            (json!(-0.0), json!(0)),
            (json!(3), json!(3.5)),
        ];
        for (a, b) in pairs {
            assert_eq!(
                values_equal(&a, &b),
                stringify_value(&a) == stringify_value(&b),
                "{} vs {}",
                a,
                b
            );
        }
    }

    #[test]
    fn test_stringify_scalars() {
        assert_eq!(stringify_value(&json!(true)), "true");
        assert_eq!(stringify_value(&json!(null)), "null");
        assert_eq!(stringify_value(&json!(2.5)), "2.5");
        assert_eq!(stringify_value(&json!(-4.0)), "-4");
        assert_eq!(stringify_value(&json!("a \"quoted\" word")), "a \"quoted\" word");
    }

    #[test]
    fn test_stringify_nested_is_canonical() {
        let v1 = json!({"b": [1.0, "x"], "a": {"z": 1, "y": 2}});
        let v2 = json!({"a": {"y": 2, "z": 1}, "b": [1, "x"]});
        assert_eq!(stringify_value(&v1), stringify_value(&v2));
        assert_eq!(stringify_value(&v1), r#"{"a":{"y":2,"z":1},"b":[1,"x"]}"#);
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(&json!(1)), "number");
        assert_eq!(type_name(&json!("s")), "string");
        assert_eq!(type_name(&json!({})), "object");
    }
}
