use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredicateError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Unknown field: {field}{}", .suggestion.as_ref().map(|s| format!(" (did you mean '{}'?)", s)).unwrap_or_default())]
    UnknownField { field: String, suggestion: Option<&'static str> },

    #[error("Type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch { field: String, expected: &'static str, found: String },

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Expression is {length} characters long (max {max})")]
    TooLong { length: usize, max: usize },

    #[error("Expression nests too deeply at position {position} (max {max} levels)")]
    TooDeep { position: usize, max: usize },

    #[error("Expression has {clauses} clauses (max {max})")]
    TooComplex { clauses: usize, max: usize },
}

impl PredicateError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        PredicateError::Syntax { position, message: message.into() }
    }
}
