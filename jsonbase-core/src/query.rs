// src/query.rs
//! Query-by-example matching
//!
//! A query maps field paths to either a literal (equality) or an operator
//! document. Clauses are ANDed; an empty query matches every document.
//!
//! ```text
//! { "name": "Alice", "age": { "$gte": 18 } }
//!   └─ Equals("Alice")  └─ Operators([Gte(18)])
//! ```
//!
//! Unknown operator keys (`$exists`, `$foo`, ...) and plain keys mixed into
//! an operator document are ignored, so such a clause is satisfied
//! vacuously. That permissiveness is kept on purpose.

pub mod operators;

use serde_json::Value;
use tracing::debug;

use crate::document::Document;
use crate::error::{JsonBaseError, Result};
use crate::value_utils::values_equal;

pub use operators::Operator;

/// What a single field must satisfy
#[derive(Debug, Clone)]
pub enum Condition {
    /// `{ field: literal }`
    Equals(Value),
    /// `{ field: { $op: operand, ... } }`; an empty list is always satisfied
    Operators(Vec<Operator>),
}

/// One `(path, condition)` pair of a query
#[derive(Debug, Clone)]
pub struct FieldClause {
    pub path: String,
    pub condition: Condition,
}

impl FieldClause {
    /// Evaluate against a document (short-circuits on the first failing operator)
    pub fn matches(&self, document: &Document) -> Result<bool> {
        let doc_value = document.get(&self.path);

        match &self.condition {
            Condition::Equals(expected) => {
                Ok(doc_value.map(|v| values_equal(v, expected)).unwrap_or(false))
            }
            Condition::Operators(ops) => {
                for op in ops {
                    if !op.matches(&self.path, doc_value)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

/// Parsed query
///
/// # Examples
///
/// ```
/// use jsonbase_core::{Document, Query};
/// use serde_json::json;
///
/// let doc = Document::prepare(json!({"name": "Alice", "age": 30})).unwrap();
/// let query = Query::from_json(&json!({"age": {"$gte": 18}, "name": "Alice"})).unwrap();
/// assert!(query.matches(&doc).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    clauses: Vec<FieldClause>,
}

impl Query {
    /// Empty query (matches all documents)
    pub fn new() -> Self {
        Query::default()
    }

    /// Parse a JSON query object
    ///
    /// # Errors
    ///
    /// `InvalidQuery` if `json` is not an object, if `$in` is given a
    /// non-array, or if a `$regex` pattern is not a valid regex string.
    pub fn from_json(json: &Value) -> Result<Self> {
        let filter = json
            .as_object()
            .ok_or_else(|| JsonBaseError::InvalidQuery("Filter must be an object".to_string()))?;

        let mut clauses = Vec::with_capacity(filter.len());
        for (path, spec) in filter {
            let condition = match spec {
                Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => {
                    let mut ops = Vec::with_capacity(obj.len());
                    for (name, operand) in obj {
                        match Operator::parse(name, operand)? {
                            Some(op) => ops.push(op),
                            None => {
                                debug!(field = %path, key = %name, "ignoring unsupported operator")
                            }
                        }
                    }
                    Condition::Operators(ops)
                }
                literal => Condition::Equals(literal.clone()),
            };
            clauses.push(FieldClause {
                path: path.clone(),
                condition,
            });
        }

        Ok(Query { clauses })
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[FieldClause] {
        &self.clauses
    }

    /// Check if a document satisfies every clause
    ///
    /// # Errors
    ///
    /// Propagates `TypeMismatch` from ordered operators.
    pub fn matches(&self, document: &Document) -> Result<bool> {
        for clause in &self.clauses {
            if !clause.matches(document)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `(path, literal)` pairs when every clause is plain equality
    ///
    /// Returns `None` as soon as one clause uses an operator document. Used
    /// to decide whether indexes can answer the query.
    pub fn equality_terms(&self) -> Option<Vec<(&str, &Value)>> {
        self.clauses
            .iter()
            .map(|clause| match &clause.condition {
                Condition::Equals(value) => Some((clause.path.as_str(), value)),
                Condition::Operators(_) => None,
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
