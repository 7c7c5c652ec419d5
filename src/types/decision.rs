//! Evaluation results and the access decision derived from them.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display as StrumDisplay, EnumString};

use crate::error::BenchError;

/// One row of a query result: the values of the query's expressions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub expressions: Vec<Value>,
}

/// Every row produced by one evaluation of a prepared query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet(pub Vec<QueryResult>);

impl ResultSet {
    pub fn single(value: Value) -> Self {
        ResultSet(vec![QueryResult {
            expressions: vec![value],
        }])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ResultSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let rows: Vec<&Vec<Value>> = self.0.iter().map(|r| &r.expressions).collect();
        match serde_json::to_string(&rows) {
            Ok(s) => write!(f, "{s}"),
            Err(_) => write!(f, "{rows:?}"),
        }
    }
}

/// Allow or deny.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, StrumDisplay, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl TryFrom<&ResultSet> for Decision {
    type Error = BenchError;

    /// A decision result must be exactly one row whose first expression is
    /// a boolean.
    fn try_from(results: &ResultSet) -> Result<Self, Self::Error> {
        match results.0.as_slice() {
            [row] => match row.expressions.first() {
                Some(Value::Bool(allowed)) => Ok(Decision::from_allowed(*allowed)),
                _ => Err(shape_error(results)),
            },
            _ => Err(shape_error(results)),
        }
    }
}

fn shape_error(results: &ResultSet) -> BenchError {
    BenchError::UnexpectedResult {
        expected: "a single boolean expression".to_string(),
        actual: results.to_string(),
    }
}
