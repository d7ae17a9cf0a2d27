//! Boolean expression trees and key filters

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Primitive;

/// Operator joining the children of a [`BoolExpression`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOperator {
    /// All children must match
    And,
    /// At least one child must match
    Or,
}

impl fmt::Display for BoolOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOperator::And => f.write_str("AND"),
            BoolOperator::Or => f.write_str("OR"),
        }
    }
}

/// Children combined under one operator
#[derive(Debug, Clone, PartialEq)]
pub struct BoolExpression {
    /// Operator
    pub operator: BoolOperator,
    /// Children, in order
    pub expressions: Vec<Expression>,
}

/// One node of a filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Leaf
    Primitive(Primitive),
    /// Inner node
    Bool(BoolExpression),
}

impl Expression {
    /// Returns true for the empty expression produced by `and([])` / `or([])`
    pub fn is_neutral(&self) -> bool {
        matches!(self, Expression::Bool(b) if b.expressions.is_empty())
    }

    /// Check that every inner node has at least two children.
    pub fn validate(&self) -> Result<()> {
        match self {
            Expression::Primitive(_) => Ok(()),
            Expression::Bool(b) => {
                if b.expressions.len() < 2 {
                    return Err(Error::invalid_argument(format!(
                        "{} expression requires at least 2 expressions, got {}",
                        b.operator,
                        b.expressions.len()
                    )));
                }
                b.expressions.iter().try_for_each(Expression::validate)
            }
        }
    }

    /// Number of leaves in the tree
    pub fn primitive_count(&self) -> usize {
        match self {
            Expression::Primitive(_) => 1,
            Expression::Bool(b) => b.expressions.iter().map(Expression::primitive_count).sum(),
        }
    }
}

impl From<Primitive> for Expression {
    fn from(p: Primitive) -> Self {
        Expression::Primitive(p)
    }
}

impl From<BoolExpression> for Expression {
    fn from(b: BoolExpression) -> Self {
        Expression::Bool(b)
    }
}

fn combine(operator: BoolOperator, expressions: Vec<Expression>) -> Expression {
    let mut expressions = expressions;
    if expressions.len() == 1 {
        if let Some(only) = expressions.pop() {
            return only;
        }
    }
    Expression::Bool(BoolExpression {
        operator,
        expressions,
    })
}

/// AND of `expressions`.
///
/// No arguments yield the neutral expression, a single argument is returned
/// as is, anything more is wrapped.
pub fn and(expressions: impl IntoIterator<Item = Expression>) -> Expression {
    combine(BoolOperator::And, expressions.into_iter().collect())
}

/// OR of `expressions`, collapsing like [`and`].
pub fn or(expressions: impl IntoIterator<Item = Expression>) -> Expression {
    combine(BoolOperator::Or, expressions.into_iter().collect())
}

/// A named query against a read or event key
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFilter {
    /// Read or event key
    pub key: String,
    /// Expressions, implicitly combined with AND
    pub expressions: Vec<Expression>,
}

impl KeyFilter {
    /// Validate every expression of the filter
    pub fn validate(&self) -> Result<()> {
        self.expressions.iter().try_for_each(Expression::validate)
    }
}

/// Build a [`KeyFilter`], rejecting inner nodes with fewer than two children.
pub fn where_key(
    key: impl Into<String>,
    expressions: impl IntoIterator<Item = Expression>,
) -> Result<KeyFilter> {
    let filter = KeyFilter {
        key: key.into(),
        expressions: expressions.into_iter().collect(),
    };
    filter.validate()?;
    Ok(filter)
}
