//! Error types for parsing and evaluating sandbox expressions.

use thiserror::Error;

/// An error that occurred while parsing an expression.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// A syntax error with location information.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// The expression nests deeper than the configured limit.
    #[error("expression nests deeper than {max_depth} levels")]
    TooDeep { max_depth: usize },

    /// The expression chains more operators than the configured limit.
    #[error("expression has more than {max_operators} operators")]
    TooLong { max_operators: usize },

    /// Nothing to evaluate.
    #[error("empty expression")]
    Empty,
}

/// An error that occurred while evaluating a parsed expression.
#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    /// Identifier not bound in the evaluation scope.
    #[error("'{name}' is not defined")]
    UnknownIdentifier { name: String },

    /// Property read on `null`.
    #[error("cannot read property '{property}' of null")]
    NullAccess { property: String },

    /// Call target is not a namespace function or method.
    #[error("'{target}' is not a function")]
    NotCallable { target: String },

    /// Namespace function or method that does not exist.
    #[error("unknown function '{namespace}.{name}'")]
    UnknownFunction { namespace: String, name: String },

    /// Argument of the wrong type.
    #[error("{function}: expected {expected}")]
    TypeMismatch {
        function: String,
        expected: &'static str,
    },

    /// Evaluation produced NaN or an infinity.
    #[error("result is not a finite number")]
    NonFinite,

    /// Maximum evaluation depth exceeded.
    #[error("maximum evaluation depth exceeded")]
    MaxDepthExceeded,
}

/// Any failure from [`crate::evaluate`].
#[derive(Debug, Error, PartialEq)]
pub enum ScriptError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
