//! Leaf primitives and the visitor they dispatch to

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::ConfidenceLevel;
use crate::value::Value;

use super::Expression;

/// Comparison applied by a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Neq => "!=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Gte => ">=",
            ComparisonOperator::Lte => "<=",
        };
        f.write_str(s)
    }
}

/// One value/operator pair of a comparator
#[derive(Debug, Clone, PartialEq)]
pub struct ValueComparator {
    /// Right-hand side of the comparison
    pub value: Value,
    /// Operator
    pub operator: ComparisonOperator,
}

/// Chain-specific primitive, opaque to the core
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionPrimitive {
    /// Identifier the translator registry is keyed by
    pub id: String,
    /// Primitive-specific content
    pub payload: Value,
}

/// A leaf of the expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Compare a named field against an ordered list of values
    Comparator {
        /// Field name
        name: String,
        /// Comparisons, all of which apply
        value_comparators: Vec<ValueComparator>,
    },
    /// Compare block height
    Block {
        /// Block height, decimal
        block: String,
        /// Operator
        operator: ComparisonOperator,
    },
    /// Restrict to a confidence level
    Confidence(ConfidenceLevel),
    /// Compare block timestamp
    Timestamp {
        /// Seconds since epoch
        timestamp: u64,
        /// Operator
        operator: ComparisonOperator,
    },
    /// Match one transaction
    TxHash {
        /// Transaction hash
        tx_hash: String,
    },
    /// Chain-specific primitive
    Extension(ExtensionPrimitive),
}

impl Primitive {
    /// Dispatch to the visitor method matching this primitive.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output> {
        match self {
            Primitive::Comparator {
                name,
                value_comparators,
            } => visitor.visit_comparator(name, value_comparators),
            Primitive::Block { block, operator } => visitor.visit_block(block, *operator),
            Primitive::Confidence(level) => visitor.visit_confidence(*level),
            Primitive::Timestamp {
                timestamp,
                operator,
            } => visitor.visit_timestamp(*timestamp, *operator),
            Primitive::TxHash { tx_hash } => visitor.visit_tx_hash(tx_hash),
            Primitive::Extension(ext) => visitor.visit_extension(ext),
        }
    }

    /// Variant name, for diagnostics
    pub fn kind(&self) -> &str {
        match self {
            Primitive::Comparator { .. } => "comparator",
            Primitive::Block { .. } => "block",
            Primitive::Confidence(_) => "confidence",
            Primitive::Timestamp { .. } => "timestamp",
            Primitive::TxHash { .. } => "tx_hash",
            Primitive::Extension(ext) => &ext.id,
        }
    }
}

/// Walks primitives.
///
/// The base primitive set is required. Chain-specific visitors override
/// [`visit_extension`](Visitor::visit_extension) for the ids they know; the
/// default rejects every extension.
pub trait Visitor {
    /// What each visit produces
    type Output;

    /// Visit a comparator
    fn visit_comparator(
        &mut self,
        name: &str,
        value_comparators: &[ValueComparator],
    ) -> Result<Self::Output>;

    /// Visit a block filter
    fn visit_block(&mut self, block: &str, operator: ComparisonOperator) -> Result<Self::Output>;

    /// Visit a confidence filter
    fn visit_confidence(&mut self, level: ConfidenceLevel) -> Result<Self::Output>;

    /// Visit a timestamp filter
    fn visit_timestamp(
        &mut self,
        timestamp: u64,
        operator: ComparisonOperator,
    ) -> Result<Self::Output>;

    /// Visit a transaction hash filter
    fn visit_tx_hash(&mut self, tx_hash: &str) -> Result<Self::Output>;

    /// Visit a chain-specific primitive
    fn visit_extension(&mut self, primitive: &ExtensionPrimitive) -> Result<Self::Output> {
        Err(Error::invalid_argument(format!(
            "unrecognised primitive '{}'",
            primitive.id
        )))
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Comparator expression
pub fn comparator(
    name: impl Into<String>,
    value_comparators: impl IntoIterator<Item = (Value, ComparisonOperator)>,
) -> Expression {
    Expression::Primitive(Primitive::Comparator {
        name: name.into(),
        value_comparators: value_comparators
            .into_iter()
            .map(|(value, operator)| ValueComparator { value, operator })
            .collect(),
    })
}

/// Block height expression
pub fn block(block: impl Into<String>, operator: ComparisonOperator) -> Expression {
    Expression::Primitive(Primitive::Block {
        block: block.into(),
        operator,
    })
}

/// Confidence expression
pub fn confidence(level: ConfidenceLevel) -> Expression {
    Expression::Primitive(Primitive::Confidence(level))
}

/// Timestamp expression
pub fn timestamp(timestamp: u64, operator: ComparisonOperator) -> Expression {
    Expression::Primitive(Primitive::Timestamp {
        timestamp,
        operator,
    })
}

/// Transaction hash expression
pub fn tx_hash(tx_hash: impl Into<String>) -> Expression {
    Expression::Primitive(Primitive::TxHash {
        tx_hash: tx_hash.into(),
    })
}

/// Chain-specific expression
pub fn extension(id: impl Into<String>, payload: Value) -> Expression {
    Expression::Primitive(Primitive::Extension(ExtensionPrimitive {
        id: id.into(),
        payload,
    }))
}
