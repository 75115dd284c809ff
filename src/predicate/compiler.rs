use crate::config::CONFIG;
use crate::entity::{EntityDescriptor, FieldDef, FieldKind, FieldValue};

use super::error::PredicateError;
use super::parser::{Expr, Literal, Member, Parser};
use super::types::{CompareOp, Predicate, TextOp};

/// Compiles filter text into a [`Predicate`] for one entity type.
///
/// Only fields declared in the entity descriptor can be referenced, and every literal is
/// checked against its field's kind here, so a compiled predicate cannot fail at evaluation.
pub struct PredicateCompiler {
    descriptor: &'static EntityDescriptor,
    max_length: usize,
    max_clauses: usize,
    max_depth: usize,
}

impl PredicateCompiler {
    pub fn new(descriptor: &'static EntityDescriptor) -> Self {
        Self {
            descriptor,
            max_length: CONFIG.predicate.max_expression_length,
            max_clauses: CONFIG.predicate.max_clauses,
            max_depth: CONFIG.predicate.max_nested_depth,
        }
    }

    pub fn with_limits(mut self, max_length: usize, max_clauses: usize) -> Self {
        self.max_length = max_length;
        self.max_clauses = max_clauses;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn compile(&self, text: &str) -> Result<Predicate, PredicateError> {
        let length = text.chars().count();
        if length > self.max_length {
            return Err(PredicateError::TooLong { length, max: self.max_length });
        }

        let expr = Parser::parse(text, self.max_depth)?;
        let predicate = self.lower(expr)?;

        let clauses = predicate.clauses();
        if clauses > self.max_clauses {
            return Err(PredicateError::TooComplex { clauses, max: self.max_clauses });
        }

        if CONFIG.predicate.debug_logging {
            tracing::debug!("Compiled predicate for {}: {} -> {:?}", self.descriptor.resource, text, predicate);
        }
        Ok(predicate)
    }

    /// Equality conjunct for a query-string filter such as `?RecordType=ADD`.
    /// Returns `Ok(None)` when `name` is not a field of the entity.
    pub fn field_equals(&self, name: &str, raw: &str) -> Result<Option<Predicate>, PredicateError> {
        let Some(field) = self.descriptor.field(name) else {
            return Ok(None);
        };
        let value = field.parse(raw).map_err(|_| PredicateError::TypeMismatch {
            field: field.name.to_string(),
            expected: field.kind.name(),
            found: format!("{:?}", raw),
        })?;
        Ok(Some(Predicate::equals(field, value)))
    }

    fn lower(&self, expr: Expr) -> Result<Predicate, PredicateError> {
        match expr {
            Expr::Literal(Literal::Bool(b)) => Ok(Predicate::Const(b)),
            Expr::Literal(other) => Err(PredicateError::TypeMismatch {
                field: "<expression>".to_string(),
                expected: "boolean",
                found: other.describe(),
            }),
            Expr::Member(member) => {
                let field = self.resolve(&member)?;
                if field.kind != FieldKind::Boolean {
                    return Err(PredicateError::TypeMismatch {
                        field: field.name.to_string(),
                        expected: "boolean",
                        found: field.kind.name().to_string(),
                    });
                }
                Ok(Predicate::equals(field, FieldValue::Boolean(true)))
            }
            Expr::Compare { member, op, literal } => {
                let field = self.resolve(&member)?;
                self.lower_compare(field, op, literal)
            }
            Expr::Method { member, method, argument } => {
                let field = self.resolve(&member)?;
                let op = TextOp::from_method(&method)
                    .ok_or_else(|| PredicateError::UnsupportedOperator(format!("method '{}'", method)))?;
                if field.kind != FieldKind::Text {
                    return Err(PredicateError::TypeMismatch {
                        field: field.name.to_string(),
                        expected: "text",
                        found: field.kind.name().to_string(),
                    });
                }
                match argument {
                    Literal::Str(value) => Ok(Predicate::Text { field, op, value }),
                    other => Err(PredicateError::TypeMismatch {
                        field: field.name.to_string(),
                        expected: "string argument",
                        found: other.describe(),
                    }),
                }
            }
            Expr::And(a, b) => Ok(Predicate::And(Box::new(self.lower(*a)?), Box::new(self.lower(*b)?))),
            Expr::Or(a, b) => Ok(self.lower(*a)?.or(self.lower(*b)?)),
            Expr::Not(inner) => Ok(self.lower(*inner)?.negate()),
        }
    }

    fn resolve(&self, member: &Member) -> Result<&'static FieldDef, PredicateError> {
        self.descriptor.field(&member.field).ok_or_else(|| PredicateError::UnknownField {
            field: member.field.clone(),
            suggestion: self.descriptor.suggest(&member.field),
        })
    }

    fn lower_compare(
        &self,
        field: &'static FieldDef,
        op: CompareOp,
        literal: Literal,
    ) -> Result<Predicate, PredicateError> {
        if let Literal::Null = literal {
            if op.is_ordering() {
                return Err(PredicateError::UnsupportedOperator(format!("'{}' against null", op.symbol())));
            }
            if !field.nullable {
                return Err(PredicateError::TypeMismatch {
                    field: field.name.to_string(),
                    expected: field.kind.name(),
                    found: "null (field is not nullable)".to_string(),
                });
            }
            return Ok(Predicate::IsNull { field, negated: op == CompareOp::Ne });
        }

        if op.is_ordering() && !field.kind.is_ordered() {
            return Err(PredicateError::UnsupportedOperator(format!(
                "'{}' on {} field '{}'",
                op.symbol(),
                field.kind.name(),
                field.name
            )));
        }

        let mismatch = |literal: &Literal| PredicateError::TypeMismatch {
            field: field.name.to_string(),
            expected: field.kind.name(),
            found: literal.describe(),
        };

        let value = match (field.kind, &literal) {
            (FieldKind::Integer, Literal::Int(i)) => FieldValue::Integer(*i),
            (FieldKind::Boolean, Literal::Bool(b)) => FieldValue::Boolean(*b),
            (FieldKind::Text, Literal::Str(s)) => FieldValue::Text(s.clone()),
            (FieldKind::Timestamp | FieldKind::Date | FieldKind::Uuid, Literal::Str(s)) => {
                field.kind.parse(s).map_err(|_| mismatch(&literal))?
            }
            _ => return Err(mismatch(&literal)),
        };

        Ok(Predicate::Compare { field, op, value })
    }
}
