//! Flat wire form of key filters and expression trees
//!
//! Each wire node holds an optional evaluator, mirroring a oneof: exactly
//! one of a primitive or a boolean expression. Operators and child order are
//! carried as is, so converting to the wire and back reproduces the tree.
//!
//! Comparator values travel as versioned envelopes in the session encoding;
//! extension payloads go through the [`PrimitiveRegistry`].

use serde::{Deserialize, Serialize};

use chainread_core::{
    BoolExpression, BoolOperator, ComparisonOperator, ConfidenceLevel, EncodingVersion, Error,
    Expression, ExtensionPrimitive, KeyFilter, Primitive, Result, Value, ValueComparator,
    VersionedBytes, Visitor,
};

use crate::registry::PrimitiveRegistry;

/// Wire form of [`KeyFilter`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireKeyFilter {
    /// Read or event key
    pub key: String,
    /// Expressions, in order
    pub expressions: Vec<WireExpression>,
}

/// One node of a wire expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireExpression {
    /// Node content; absent only in malformed messages
    pub evaluator: Option<WireEvaluator>,
}

/// Content of a [`WireExpression`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireEvaluator {
    /// Leaf
    Primitive(WirePrimitive),
    /// Inner node
    BooleanExpression(WireBoolExpression),
}

/// Wire form of [`BoolExpression`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireBoolExpression {
    /// Operator
    pub operator: BoolOperator,
    /// Children, in order
    pub expressions: Vec<WireExpression>,
}

/// A comparator value/operator pair on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireValueComparator {
    /// Encoded right-hand side
    pub value: VersionedBytes,
    /// Operator
    pub operator: ComparisonOperator,
}

/// Wire form of [`Primitive`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WirePrimitive {
    /// Field comparator
    Comparator {
        /// Field name
        name: String,
        /// Comparisons, in order
        value_comparators: Vec<WireValueComparator>,
    },
    /// Block height filter
    Block {
        /// Block height, decimal
        block_number: String,
        /// Operator
        operator: ComparisonOperator,
    },
    /// Confidence filter
    Confidence {
        /// Level
        confidence_level: ConfidenceLevel,
    },
    /// Timestamp filter
    Timestamp {
        /// Seconds since epoch
        timestamp: u64,
        /// Operator
        operator: ComparisonOperator,
    },
    /// Transaction hash filter
    TxHash {
        /// Hash
        tx_hash: String,
    },
    /// Chain-specific primitive
    Extension {
        /// Translator id
        id: String,
        /// Translator output
        payload: VersionedBytes,
    },
}

/// Converts expressions to and from the wire
#[derive(Debug, Clone, Copy)]
pub struct ExpressionCodec<'a> {
    encoding: EncodingVersion,
    registry: &'a PrimitiveRegistry,
}

impl<'a> ExpressionCodec<'a> {
    /// Codec encoding values with `encoding` and extensions via `registry`
    pub fn new(encoding: EncodingVersion, registry: &'a PrimitiveRegistry) -> Self {
        Self { encoding, registry }
    }

    /// Convert a key filter to the wire
    pub fn key_filter_to_wire(&self, filter: &KeyFilter) -> Result<WireKeyFilter> {
        Ok(WireKeyFilter {
            key: filter.key.clone(),
            expressions: self.expressions_to_wire(&filter.expressions)?,
        })
    }

    /// Convert a key filter from the wire
    pub fn key_filter_from_wire(&self, wire: &WireKeyFilter) -> Result<KeyFilter> {
        Ok(KeyFilter {
            key: wire.key.clone(),
            expressions: wire
                .expressions
                .iter()
                .map(|e| self.expression_from_wire(e))
                .collect::<Result<Vec<_>>>()?,
        })
    }

    fn expressions_to_wire(&self, expressions: &[Expression]) -> Result<Vec<WireExpression>> {
        expressions
            .iter()
            .map(|e| self.expression_to_wire(e))
            .collect()
    }

    /// Convert one expression to the wire
    pub fn expression_to_wire(&self, expression: &Expression) -> Result<WireExpression> {
        let evaluator = match expression {
            Expression::Primitive(p) => WireEvaluator::Primitive(p.accept(&mut ToWire(self))?),
            Expression::Bool(b) => WireEvaluator::BooleanExpression(WireBoolExpression {
                operator: b.operator,
                expressions: self.expressions_to_wire(&b.expressions)?,
            }),
        };
        Ok(WireExpression {
            evaluator: Some(evaluator),
        })
    }

    /// Convert one expression from the wire
    pub fn expression_from_wire(&self, wire: &WireExpression) -> Result<Expression> {
        match &wire.evaluator {
            Some(WireEvaluator::Primitive(p)) => {
                Ok(Expression::Primitive(self.primitive_from_wire(p)?))
            }
            Some(WireEvaluator::BooleanExpression(b)) => Ok(Expression::Bool(BoolExpression {
                operator: b.operator,
                expressions: b
                    .expressions
                    .iter()
                    .map(|e| self.expression_from_wire(e))
                    .collect::<Result<Vec<_>>>()?,
            })),
            None => Err(Error::invalid_argument("expression has no evaluator")),
        }
    }

    fn primitive_from_wire(&self, wire: &WirePrimitive) -> Result<Primitive> {
        Ok(match wire {
            WirePrimitive::Comparator {
                name,
                value_comparators,
            } => Primitive::Comparator {
                name: name.clone(),
                value_comparators: value_comparators
                    .iter()
                    .map(|vc| {
                        Ok(ValueComparator {
                            value: vc.value.decode::<Value>()?,
                            operator: vc.operator,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            },
            WirePrimitive::Block {
                block_number,
                operator,
            } => Primitive::Block {
                block: block_number.clone(),
                operator: *operator,
            },
            WirePrimitive::Confidence { confidence_level } => {
                Primitive::Confidence(*confidence_level)
            }
            WirePrimitive::Timestamp {
                timestamp,
                operator,
            } => Primitive::Timestamp {
                timestamp: *timestamp,
                operator: *operator,
            },
            WirePrimitive::TxHash { tx_hash } => Primitive::TxHash {
                tx_hash: tx_hash.clone(),
            },
            WirePrimitive::Extension { id, payload } => {
                let payload = self.registry.get(id)?.from_wire(payload)?;
                Primitive::Extension(ExtensionPrimitive {
                    id: id.clone(),
                    payload,
                })
            }
        })
    }
}

struct ToWire<'c, 'a>(&'c ExpressionCodec<'a>);

impl Visitor for ToWire<'_, '_> {
    type Output = WirePrimitive;

    fn visit_comparator(
        &mut self,
        name: &str,
        value_comparators: &[ValueComparator],
    ) -> Result<WirePrimitive> {
        Ok(WirePrimitive::Comparator {
            name: name.to_string(),
            value_comparators: value_comparators
                .iter()
                .map(|vc| {
                    // Values carry no descriptor, so only the tagged scheme
                    // brings them back with their exact type
                    Ok(WireValueComparator {
                        value: VersionedBytes::encode(&vc.value, EncodingVersion::Dynamic)?,
                        operator: vc.operator,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        })
    }

    fn visit_block(&mut self, block: &str, operator: ComparisonOperator) -> Result<WirePrimitive> {
        Ok(WirePrimitive::Block {
            block_number: block.to_string(),
            operator,
        })
    }

    fn visit_confidence(&mut self, level: ConfidenceLevel) -> Result<WirePrimitive> {
        Ok(WirePrimitive::Confidence {
            confidence_level: level,
        })
    }

    fn visit_timestamp(
        &mut self,
        timestamp: u64,
        operator: ComparisonOperator,
    ) -> Result<WirePrimitive> {
        Ok(WirePrimitive::Timestamp {
            timestamp,
            operator,
        })
    }

    fn visit_tx_hash(&mut self, tx_hash: &str) -> Result<WirePrimitive> {
        Ok(WirePrimitive::TxHash {
            tx_hash: tx_hash.to_string(),
        })
    }

    fn visit_extension(&mut self, primitive: &ExtensionPrimitive) -> Result<WirePrimitive> {
        let translator = self.0.registry.get(&primitive.id)?;
        Ok(WirePrimitive::Extension {
            id: primitive.id.clone(),
            payload: translator.to_wire(&primitive.payload, self.0.encoding)?,
        })
    }
}
