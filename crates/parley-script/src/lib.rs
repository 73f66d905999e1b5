//! Capability-restricted expression language used by `(eval …)` filters.
//!
//! An expression sees only the names placed in its [`Scope`] plus the
//! built-in `_` and `Math` namespaces. There is no assignment, no function
//! definition and no access to the host.
//!
//! ```
//! use parley_script::{Scope, Value, evaluate};
//!
//! let scope = Scope::new().with("param", "world");
//! let value = evaluate("'hello ' + param.toUpperCase()", &scope).unwrap();
//! assert_eq!(value, Value::from("hello WORLD"));
//! ```

mod ast;
mod builtins;
mod error;
mod interpreter;
pub mod math;
mod parser;
pub mod path;
mod value;

pub use ast::{BinaryOp, Expr, Literal, UnaryOp};
pub use error::{EvalError, ParseError, ScriptError};
pub use interpreter::{Interpreter, Scope};
pub use parser::parse_expression;
pub use value::{Namespace, Value, format_number};

/// Default limit for both parser nesting and evaluation depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Most operator, accessor and separator characters an expression may
/// contain. Bounds the size of the tree built from a single expression.
pub const MAX_OPERATORS: usize = 512;

/// Parse and evaluate `source` against `scope`.
pub fn evaluate(source: &str, scope: &Scope) -> Result<Value, ScriptError> {
    evaluate_with_depth(source, scope, DEFAULT_MAX_DEPTH)
}

/// [`evaluate`] with an explicit depth limit.
pub fn evaluate_with_depth(
    source: &str,
    scope: &Scope,
    max_depth: usize,
) -> Result<Value, ScriptError> {
    let expr = parse_expression(source, max_depth)?;
    let value = Interpreter::new(scope, max_depth).eval(&expr)?;
    Ok(value)
}
