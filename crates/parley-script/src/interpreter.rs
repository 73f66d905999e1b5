//! Tree-walking evaluator for parsed expressions.

use std::collections::BTreeMap;

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::builtins::{call_method, call_namespace};
use crate::error::EvalError;
use crate::value::{Namespace, Value};

/// Named values visible to an expression.
///
/// `_` and `Math` are always bound to the built-in namespaces and cannot be
/// shadowed; everything else must be inserted explicitly. Nothing outside the
/// scope is reachable from an expression.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: BTreeMap<String, Value>,
}

impl Scope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Builder-style [`Scope::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a name, including the built-in namespaces.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "_" => Some(Value::Namespace(Namespace::Collections)),
            "Math" => Some(Value::Namespace(Namespace::Math)),
            _ => self.bindings.get(name).cloned(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Evaluates expressions against a [`Scope`], tracking recursion depth.
pub struct Interpreter<'a> {
    scope: &'a Scope,
    depth: usize,
    max_depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(scope: &'a Scope, max_depth: usize) -> Self {
        Self {
            scope,
            depth: 0,
            max_depth,
        }
    }

    /// Evaluate `expr`. Fails on unbound names, invalid calls and when the
    /// expression nests deeper than the configured limit.
    pub fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        if self.depth >= self.max_depth {
            return Err(EvalError::MaxDepthExceeded);
        }
        self.depth += 1;
        let result = self.eval_inner(expr);
        self.depth -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Identifier(name) => self
                .scope
                .get(name)
                .ok_or_else(|| EvalError::UnknownIdentifier { name: name.clone() }),
            Expr::Member { object, property } => {
                let value = self.eval(object)?;
                if value.is_null() {
                    return Err(EvalError::NullAccess {
                        property: property.clone(),
                    });
                }
                Ok(value.property(property))
            }
            Expr::Index { object, index } => {
                let value = self.eval(object)?;
                let key = self.eval(index)?;
                if value.is_null() {
                    return Err(EvalError::NullAccess {
                        property: key.to_string(),
                    });
                }
                Ok(value.index(&key))
            }
            Expr::Call { callee, args } => self.eval_call(callee, args),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                })
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value, EvalError> {
        let Expr::Member { object, property } = callee else {
            return Err(EvalError::NotCallable {
                target: describe(callee),
            });
        };
        let target = self.eval(object)?;
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;
        match target {
            Value::Namespace(ns) => call_namespace(ns, property, &args),
            Value::Null => Err(EvalError::NullAccess {
                property: property.clone(),
            }),
            other => call_method(&other, property, &args),
        }
    }

    /// Evaluate a left-associative chain such as `a + b - c + d` as a loop
    /// over its left spine, so a flat chain costs one level of depth no
    /// matter how many operands it has.
    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, EvalError> {
        let mut links = vec![(op, rhs)];
        let mut first = lhs;
        while let Expr::Binary { op, lhs, rhs } = first {
            links.push((*op, rhs.as_ref()));
            first = lhs.as_ref();
        }

        let mut acc = self.eval(first)?;
        for (op, rhs) in links.into_iter().rev() {
            // Logical operators short-circuit and yield an operand, not a bool.
            acc = match op {
                BinaryOp::Or if acc.is_truthy() => acc,
                BinaryOp::And if !acc.is_truthy() => acc,
                BinaryOp::Or | BinaryOp::And => self.eval(rhs)?,
                _ => {
                    let right = self.eval(rhs)?;
                    apply_binary(op, acc, right)
                }
            };
        }
        Ok(acc)
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Value {
    match op {
        BinaryOp::Or => {
            if left.is_truthy() {
                left
            } else {
                right
            }
        }
        BinaryOp::And => {
            if left.is_truthy() {
                right
            } else {
                left
            }
        }
        BinaryOp::LooseEq => Value::Bool(left.loose_eq(&right)),
        BinaryOp::LooseNe => Value::Bool(!left.loose_eq(&right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_eq(&right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_eq(&right)),
        BinaryOp::Lt => Value::Bool(left.compare(&right).is_some_and(|o| o.is_lt())),
        BinaryOp::Le => Value::Bool(left.compare(&right).is_some_and(|o| o.is_le())),
        BinaryOp::Gt => Value::Bool(left.compare(&right).is_some_and(|o| o.is_gt())),
        BinaryOp::Ge => Value::Bool(left.compare(&right).is_some_and(|o| o.is_ge())),
        BinaryOp::Add => add(&left, &right),
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
    }
}

/// `+` concatenates as soon as either side is not a number-like scalar.
fn add(left: &Value, right: &Value) -> Value {
    let numeric = |v: &Value| matches!(v, Value::Null | Value::Bool(_) | Value::Number(_));
    if numeric(left) && numeric(right) {
        Value::Number(left.to_number() + right.to_number())
    } else {
        Value::String(format!("{left}{right}"))
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(name) => name.clone(),
        Expr::Member { property, .. } => property.clone(),
        _ => "expression".to_string(),
    }
}
