// src/aggregation.rs
// Grouping and single-field numeric aggregation

use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::document::Document;
use crate::error::JsonBaseError;
use crate::value_utils::stringify_value;

// ============================================================================
// GROUPING
// ============================================================================

/// Group identity: the stringified resolved value, `None` for absent or null
pub type GroupKey = Option<String>;

/// Documents partitioned by group, ordered by first appearance
pub type Groups = IndexMap<GroupKey, Vec<Document>>;

pub fn group_key(value: Option<&Value>) -> GroupKey {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(stringify_value(v)),
    }
}

/// Partition `documents` by the value at `field`
///
/// Members keep their relative order inside each group.
pub fn group_documents(documents: Vec<Document>, field: &str) -> Groups {
    let mut groups = Groups::new();
    for doc in documents {
        let key = group_key(doc.get(field));
        groups.entry(key).or_default().push(doc);
    }
    groups
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }

    /// Fold the numeric values into a single result
    ///
    /// | op    | result                                        | empty  |
    /// |-------|-----------------------------------------------|--------|
    /// | `sum` | integer if every value is an integer, else float | `0`    |
    /// | `avg` | float                                         | `0`    |
    /// | `min` | the smallest original value                   | `null` |
    /// | `max` | the largest original value                    | `null` |
    pub fn apply(&self, values: &[&Number]) -> Value {
        match self {
            AggregateOp::Sum => sum(values),
            AggregateOp::Avg => {
                if values.is_empty() {
                    return Value::from(0);
                }
                let total: f64 = values.iter().filter_map(|n| n.as_f64()).sum();
                Value::from(total / values.len() as f64)
            }
            AggregateOp::Min => extremum(values, Ordering::Less),
            AggregateOp::Max => extremum(values, Ordering::Greater),
        }
    }
}

impl FromStr for AggregateOp {
    type Err = JsonBaseError;

    /// Case-sensitive: `"sum"`, `"avg"`, `"min"`, `"max"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(AggregateOp::Sum),
            "avg" => Ok(AggregateOp::Avg),
            "min" => Ok(AggregateOp::Min),
            "max" => Ok(AggregateOp::Max),
            other => Err(JsonBaseError::InvalidQuery(format!(
                "unknown aggregate operation '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric values resolved at `field`; everything else is skipped
pub fn numeric_values<'a>(documents: &'a [Document], field: &str) -> Vec<&'a Number> {
    documents
        .iter()
        .filter_map(|doc| match doc.get(field) {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        })
        .collect()
}

fn sum(values: &[&Number]) -> Value {
    let mut int_total: Option<i64> = Some(0);
    let mut float_total = 0.0;
    let mut all_ints = true;

    for n in values {
        match n.as_i64() {
            Some(i) if all_ints => {
                // Overflow falls back to float arithmetic
                int_total = int_total.and_then(|t| t.checked_add(i));
                if int_total.is_none() {
                    all_ints = false;
                }
            }
            _ => all_ints = false,
        }
        float_total += n.as_f64().unwrap_or(0.0);
    }

    match int_total {
        Some(total) if all_ints => Value::from(total),
        _ => Value::from(float_total),
    }
}

/// First value winning the comparison in `wanted` direction, ties keep the earliest
fn extremum(values: &[&Number], wanted: Ordering) -> Value {
    let mut best: Option<&Number> = None;
    for &n in values {
        best = match best {
            None => Some(n),
            Some(current) => match (n.as_f64(), current.as_f64()) {
                (Some(a), Some(b)) if a.partial_cmp(&b) == Some(wanted) => Some(n),
                _ => Some(current),
            },
        };
    }
    best.map(|n| Value::Number(n.clone())).unwrap_or(Value::Null)
}
