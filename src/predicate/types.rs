use std::cmp::Ordering;

use crate::entity::{Entity, FieldDef, FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }

    /// Operator with its operands swapped: `5 > x.Id` is `x.Id < 5`
    pub fn flip(&self) -> CompareOp {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Lte => CompareOp::Gte,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Gte => CompareOp::Lte,
            other => *other,
        }
    }

    pub fn is_ordering(&self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    Contains,
    StartsWith,
    EndsWith,
}

impl TextOp {
    pub fn from_method(name: &str) -> Option<Self> {
        match name {
            "Contains" => Some(TextOp::Contains),
            "StartsWith" => Some(TextOp::StartsWith),
            "EndsWith" => Some(TextOp::EndsWith),
            _ => None,
        }
    }

    /// LIKE pattern for `needle` with wildcard characters escaped
    pub fn like_pattern(&self, needle: &str) -> String {
        let escaped = needle
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        match self {
            TextOp::Contains => format!("%{}%", escaped),
            TextOp::StartsWith => format!("{}%", escaped),
            TextOp::EndsWith => format!("%{}", escaped),
        }
    }
}

/// A type-checked boolean filter over one entity type.
///
/// Null handling is two-valued: a comparison against a null field is false, except `!=`
/// which is true, so `Not` behaves the same in memory and in SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Const(bool),
    Compare { field: &'static FieldDef, op: CompareOp, value: FieldValue },
    IsNull { field: &'static FieldDef, negated: bool },
    Text { field: &'static FieldDef, op: TextOp, value: String },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn all() -> Self {
        Predicate::Const(true)
    }

    pub fn equals(field: &'static FieldDef, value: FieldValue) -> Self {
        Predicate::Compare { field, op: CompareOp::Eq, value }
    }

    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::Const(true), p) | (p, Predicate::Const(true)) => p,
            (a, b) => Predicate::And(Box::new(a), Box::new(b)),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Number of leaf conditions
    pub fn clauses(&self) -> usize {
        match self {
            Predicate::And(a, b) | Predicate::Or(a, b) => a.clauses() + b.clauses(),
            Predicate::Not(p) => p.clauses(),
            _ => 1,
        }
    }

    pub fn matches<T: Entity>(&self, entity: &T) -> bool {
        match self {
            Predicate::Const(b) => *b,
            Predicate::Compare { field, op, value } => match entity.field(field.name) {
                None | Some(FieldValue::Null) => *op == CompareOp::Ne,
                Some(actual) => actual.compare(value).map(|o| op.holds(o)).unwrap_or(false),
            },
            Predicate::IsNull { field, negated } => {
                let is_null = entity.field(field.name).map(|v| v.is_null()).unwrap_or(true);
                is_null != *negated
            }
            Predicate::Text { field, op, value } => match entity.field(field.name) {
                Some(FieldValue::Text(actual)) => match op {
                    TextOp::Contains => actual.contains(value.as_str()),
                    TextOp::StartsWith => actual.starts_with(value.as_str()),
                    TextOp::EndsWith => actual.ends_with(value.as_str()),
                },
                _ => false,
            },
            Predicate::And(a, b) => a.matches(entity) && b.matches(entity),
            Predicate::Or(a, b) => a.matches(entity) || b.matches(entity),
            Predicate::Not(p) => !p.matches(entity),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FieldValue>,
}
